//! # Exam Shuffle
//!
//! 越南语试卷（.docx）混排工具：打乱题目和选项顺序，改写题号与选项标签，
//! 并为每个版本（mã đề）生成答案。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有 docx 归档，只暴露能力
//! - `DocxPackage` - 取出 / 放回 `word/document.xml`
//! - `XmlDocument` - 可修改的 XML 树
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理块和题组
//! - `segmenter` - 分段、定位部分标记
//! - `permutation` - Fisher–Yates 混排、推导答案
//! - `relabeler` - 就地改写标签
//! - `answer_key` / `WarnWriter` - 导出答案、写 warn.txt
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个部分"的完整处理流程
//! - `PartCtx` - 上下文封装（版本 + 部分）
//! - `PartFlow` - 流程编排（分段 → 混排 → 改写 → 记录答案）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量版本处理器，管理并发和输出
//! - `orchestrator/paper_processor` - 单个版本处理器，拼装各部分
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod test_support;

// 重新导出常用类型
pub use config::{Config, EngineOptions};
pub use error::{AppError, AppResult, DocxError, ShuffleError};
pub use infrastructure::DocxPackage;
pub use models::{AnswerRecord, ExamPart, ShuffleMode, VersionKey};
pub use orchestrator::{shuffle, App, ExamShuffler, RunSummary};
pub use workflow::{PartCtx, PartFlow};
