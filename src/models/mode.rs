use serde::{Deserialize, Serialize};

/// 混排模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShuffleMode {
    /// 自动识别 PHẦN 1 / 2 / 3
    Auto,
    /// 全卷按选择题（A. B. C. D.）处理
    #[serde(alias = "mcqflat", alias = "mcqFlat")]
    Mcq,
    /// 全卷按判断题（a) b) c) d)）处理
    #[serde(alias = "tfflat", alias = "tfFlat")]
    Tf,
}

impl ShuffleMode {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            ShuffleMode::Auto => "auto",
            ShuffleMode::Mcq => "mcq",
            ShuffleMode::Tf => "tf",
        }
    }

    /// 尝试从字符串解析模式（忽略大小写）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Some(ShuffleMode::Auto),
            "mcq" | "mcqflat" | "mcq_flat" => Some(ShuffleMode::Mcq),
            "tf" | "tfflat" | "tf_flat" => Some(ShuffleMode::Tf),
            _ => None,
        }
    }

    /// 平铺模式下整卷对应的部分
    pub fn flat_part(self) -> Option<ExamPart> {
        match self {
            ShuffleMode::Auto => None,
            ShuffleMode::Mcq => Some(ExamPart::MultipleChoice),
            ShuffleMode::Tf => Some(ExamPart::TrueFalse),
        }
    }
}

impl std::fmt::Display for ShuffleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 试卷的三个部分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExamPart {
    /// PHẦN 1：四选一
    MultipleChoice = 1,
    /// PHẦN 2：对错判断（a/b/c/d）
    TrueFalse = 2,
    /// PHẦN 3：简答
    ShortAnswer = 3,
}

impl ExamPart {
    pub const ALL: [ExamPart; 3] = [
        ExamPart::MultipleChoice,
        ExamPart::TrueFalse,
        ExamPart::ShortAnswer,
    ];

    /// 部分编号（1/2/3）
    pub fn number(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ExamPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PHẦN {}", self.number())
    }
}
