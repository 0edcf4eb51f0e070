pub mod part_ctx;
pub mod part_flow;

pub use part_ctx::PartCtx;
pub use part_flow::{PartFlow, PartOutcome};
