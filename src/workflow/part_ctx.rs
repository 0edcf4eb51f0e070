//! 部分处理上下文
//!
//! 封装"我正在处理哪个版本的哪一部分"这一信息

use crate::models::mode::ExamPart;
use std::fmt::Display;

/// 部分处理上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartCtx {
    /// 版本序号（从 1 开始，仅用于日志和警告）
    pub version: usize,

    /// 当前部分
    pub part: ExamPart,

    /// 是否是不分部分的平铺模式
    pub flat: bool,
}

impl PartCtx {
    pub fn new(version: usize, part: ExamPart) -> Self {
        Self {
            version,
            part,
            flat: false,
        }
    }

    /// 平铺模式：整份文档按同一种题型处理
    pub fn flat(version: usize, part: ExamPart) -> Self {
        Self {
            version,
            part,
            flat: true,
        }
    }

    pub fn version_label(&self) -> String {
        format!("V{}", self.version)
    }
}

impl Display for PartCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.flat {
            write!(f, "[Mã đề V{} 平铺 {}]", self.version, self.part)
        } else {
            write!(f, "[Mã đề V{} {}]", self.version, self.part)
        }
    }
}
