//! Data models for the pollen annotator.

mod annotation;
mod category;

pub use annotation::{BoxKind, BoxSet, LabeledBox, Rectangle};
pub use category::{POLLEN_CLASSES, default_vocabulary};
