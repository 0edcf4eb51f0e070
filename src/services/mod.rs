pub mod answer_key;
pub mod inspector;
pub mod permutation;
pub mod relabeler;
pub mod segmenter;
pub mod warn_writer;

pub use relabeler::LabelStyle;
pub use warn_writer::{KeyWarning, WarnWriter};
