//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量生成和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量版本处理器
//! - 管理应用生命周期（初始化、运行）
//! - 控制并发数量（Semaphore）
//! - auto 模式失败时的退路
//! - 写出 docx / csv / zip / json 和 warn.txt
//! - 输出全局统计信息
//!
//! ### `paper_processor` - 单个版本处理器
//! - 定位 PHẦN 1 / 2 / 3
//! - 每个部分交给 PartFlow
//! - 拼装块序列并回写归档
//! - 汇总答案记录
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (生成 N 个版本)
//!     ↓
//! paper_processor (处理一个版本的各个部分)
//!     ↓
//! workflow::PartFlow (处理一个部分)
//!     ↓
//! services (能力层：分段 / 混排 / 改写标签 / 导出)
//!     ↓
//! infrastructure (基础设施：DocxPackage、XML 树)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，paper_processor 管单个
//! 2. **资源隔离**：只有编排层持有原始归档
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure

pub mod batch_processor;
pub mod paper_processor;

// 重新导出主要类型
pub use batch_processor::{App, RunSummary};
pub use paper_processor::{shuffle, shuffle_blocks, ExamShuffler, ShuffleOutput};
