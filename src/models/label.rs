//! 标签模式
//!
//! 题号 `Câu N.`、选择题选项 `A.`、判断题选项 `a)`、简答答案行 `Đáp án: ...`
//! 都靠块的开头文本识别。一个块最多匹配一种。

use crate::models::mode::ExamPart;
use regex::Regex;
use std::sync::LazyLock;

static QUESTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Câu\s*\d+\b").expect("题号正则"));
static MCQ_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-D])[.)]").expect("选择题选项正则"));
static TF_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([a-d])\)").expect("判断题选项正则"));
static FREE_ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*Đáp\s*án\s*[:\-]\s*(.*?)\s*$").expect("答案行正则")
});

static LABEL_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-D][.)]|[a-d]\)|(?i:Câu)\s*\d+\.)$").expect("纯标签正则")
});

static PART_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^PHẦN\s*\d\b").expect("部分起始正则"));
static PART_MARKERS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [1, 2, 3].map(|n| Regex::new(&format!(r"(?i)PHẦN\s*{}\b", n)).expect("部分标记正则"))
});

/// 块开头可识别的标签种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// `Câu N.`
    QuestionHeader,
    /// `A.` / `B)` ...
    McqOption,
    /// `a)` / `b)` ...
    TfOption,
    /// `Đáp án: ...`
    FreeAnswerLine,
}

impl LabelKind {
    /// 按 题号 → 选择题选项 → 判断题选项 → 答案行 的顺序匹配，先中先得
    pub fn detect(text: &str) -> Option<Self> {
        [
            LabelKind::QuestionHeader,
            LabelKind::McqOption,
            LabelKind::TfOption,
            LabelKind::FreeAnswerLine,
        ]
        .into_iter()
        .find(|kind| kind.pattern().is_match(text))
    }

    pub fn matches(self, text: &str) -> bool {
        LabelKind::detect(text) == Some(self)
    }

    fn pattern(self) -> &'static Regex {
        match self {
            LabelKind::QuestionHeader => &QUESTION_HEADER,
            LabelKind::McqOption => &MCQ_OPTION,
            LabelKind::TfOption => &TF_OPTION,
            LabelKind::FreeAnswerLine => &FREE_ANSWER,
        }
    }
}

/// 选项块的原始字母（改写标签之前读取）
pub fn option_letter(kind: LabelKind, text: &str) -> Option<char> {
    let caps = match kind {
        LabelKind::McqOption => MCQ_OPTION.captures(text)?,
        LabelKind::TfOption => TF_OPTION.captures(text)?,
        _ => return None,
    };
    caps.get(1)?.as_str().chars().next()
}

/// 整段文本只是一个标签（`A.`、`a)`、`Câu 7.`）
pub fn is_label_only(text: &str) -> bool {
    LABEL_ONLY.is_match(text.trim())
}

/// 答案行中分隔符之后的内容，分隔符后为空时返回 None
pub fn free_answer(text: &str) -> Option<String> {
    FREE_ANSWER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|answer| !answer.is_empty())
        .map(str::to_string)
}

/// 文本中是否出现指定部分的标记 `PHẦN n`
pub fn is_part_marker(text: &str, part: ExamPart) -> bool {
    PART_MARKERS[usize::from(part.number()) - 1].is_match(text)
}

/// 文本是否以任意部分标记开头，用于截断题组
pub fn is_part_start(text: &str) -> bool {
    PART_START.is_match(text)
}
