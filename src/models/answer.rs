use crate::models::mode::ExamPart;
use serde::{Deserialize, Serialize};

/// 判断题答案中"正确"的标记
pub const TRUE_MARK: char = 'Đ';
/// 判断题答案中"错误"的标记
pub const FALSE_MARK: char = 'S';
/// 判断题答案中空缺槽位的占位
pub const BLANK_MARK: char = ' ';

/// 单道题在混排时推导出的答案
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedAnswer {
    /// 选择题：混排后的正确字母，没有标记时为 None
    Choice(Option<char>),
    /// 判断题：按混排后 a→b→c→d 的真假，缺失的槽位为 None
    TrueFalse([Option<bool>; 4]),
    /// 简答题：答案行内容，没有答案行时为 None
    Short(Option<String>),
}

impl DerivedAnswer {
    /// 写入答案记录的字符串形式
    ///
    /// 判断题固定 4 个字符，空槽位用空格占位。
    pub fn to_answer_string(&self) -> String {
        match self {
            DerivedAnswer::Choice(letter) => letter.map(String::from).unwrap_or_default(),
            DerivedAnswer::TrueFalse(slots) => slots
                .iter()
                .map(|slot| match slot {
                    Some(true) => TRUE_MARK,
                    Some(false) => FALSE_MARK,
                    None => BLANK_MARK,
                })
                .collect(),
            DerivedAnswer::Short(text) => text.clone().unwrap_or_default(),
        }
    }

    /// 答案不完整时返回原因（用于写 warn 文件）
    pub fn missing_reason(&self) -> Option<&'static str> {
        match self {
            DerivedAnswer::Choice(None) => Some("không xác định được đáp án (không có phương án gạch chân)"),
            DerivedAnswer::TrueFalse(slots) if slots.iter().any(Option::is_none) => {
                Some("thiếu mệnh đề a/b/c/d")
            }
            DerivedAnswer::Short(None) => Some("không có dòng \"Đáp án:\""),
            _ => None,
        }
    }
}

/// 一道题的答案记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// 部分编号 1/2/3
    pub part: u8,
    /// 混排后的题号（从 1 开始）
    pub question_number: usize,
    pub answer: String,
}

impl AnswerRecord {
    pub fn new(part: ExamPart, question_number: usize, answer: impl Into<String>) -> Self {
        Self {
            part: part.number(),
            question_number,
            answer: answer.into(),
        }
    }

    /// 导出时的答案写法：判断题展开为 `Đ,S,Đ,S`，空槽位留空
    pub fn display_answer(&self) -> String {
        if self.part == ExamPart::TrueFalse.number() {
            self.answer
                .chars()
                .map(|c| if c == BLANK_MARK { String::new() } else { c.to_string() })
                .collect::<Vec<_>>()
                .join(",")
        } else {
            self.answer.clone()
        }
    }
}

/// 一个版本（mã đề）的答案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionKey {
    /// 版本标签，例如 `V1`
    pub label: String,
    pub records: Vec<AnswerRecord>,
}

impl VersionKey {
    pub fn new(version: usize, records: Vec<AnswerRecord>) -> Self {
        Self {
            label: format!("V{}", version),
            records,
        }
    }
}
