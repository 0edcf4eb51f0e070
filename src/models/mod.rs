pub mod answer;
pub mod block;
pub mod label;
pub mod mode;
pub mod question;

pub use answer::{AnswerRecord, DerivedAnswer, VersionKey};
pub use block::{Block, BlockKind, BlockTree};
pub use label::LabelKind;
pub use mode::{ExamPart, ShuffleMode};
pub use question::{PartSegments, QuestionGroup};
