//! Command handlers - extracted from main.rs for testability
//!
//! Each handler returns what it produced; printing stays in main.rs.

pub mod build;
pub mod classify;
pub mod config;
pub mod index;
pub mod organize;
pub mod render;

pub use build::execute_build;
pub use classify::{classify_features, classify_record, execute_classify, ClassifyRow};
pub use config::execute_config;
pub use index::execute_index;
pub use organize::execute_organize;
pub use render::execute_render;
