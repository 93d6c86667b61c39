//! Pollen slide annotation engine
//!
//! Cuts composite slide scans into fixed-size crops, joins each crop to the
//! boxes the scanner already detected, and lets an operator review and extend
//! those boxes across a resumable session that exports to CSV.

pub mod app;
pub mod audit;
pub mod cli;
pub mod config;
pub mod constants;
pub mod data;
pub mod export;
pub mod grid;
pub mod labels;
pub mod layout;
pub mod model;
pub mod persist;
pub mod session;

#[cfg(test)]
mod test_support;

pub use app::{AnnotatorApp, AppError, Step};
pub use config::AnnotatorConfig;
pub use session::{AnnotationSession, SessionState};
