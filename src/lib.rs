//! Row-by-row folder provisioning.
//!
//! Each input row names a root folder and a target folder. The target is
//! created (with any missing ancestors) when the root exists, and the row is
//! passed on with `FolderCreationResult` and `FolderCreationDescription`
//! appended.

pub mod cli;
pub mod config;
pub mod logging;
pub mod provision;
pub mod record;
pub mod runner;
pub mod stream;
mod templates;
pub mod tool;

pub use provision::{ProvisionOutcome, ProvisionStatus, provision};
pub use record::{FieldInfo, Layout, OutputLayout, Record};
pub use stream::run_stream;
pub use tool::{DirectoryCreateTool, RunSummary, ToolSettings};
