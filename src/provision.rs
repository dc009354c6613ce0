use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

/// Terminal state of one provisioning attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ProvisionStatus {
    MissingRoot,
    AlreadyExists,
    Created,
    CreateFailed,
}

impl ProvisionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ProvisionStatus::AlreadyExists | ProvisionStatus::Created)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionStatus::MissingRoot => "missing-root",
            ProvisionStatus::AlreadyExists => "already-exists",
            ProvisionStatus::Created => "created",
            ProvisionStatus::CreateFailed => "create-failed",
        }
    }
}

impl fmt::Display for ProvisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProvisionOutcome {
    pub status: ProvisionStatus,
    pub result_flag: bool,
    pub message: String,
}

impl ProvisionOutcome {
    fn new(status: ProvisionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            result_flag: status.is_success(),
            message: message.into(),
        }
    }

    /// Value written to the result column: `"True"` or `"False"`.
    pub fn result_text(&self) -> &'static str {
        if self.result_flag { "True" } else { "False" }
    }
}

/// Ensure `target_path` exists as a directory, gated on `root_path` existing.
///
/// Never fails: every filesystem error is folded into
/// [`ProvisionStatus::CreateFailed`] and the cause is only logged.
pub fn provision(root_path: &str, target_path: &str) -> ProvisionOutcome {
    if !Path::new(root_path).is_dir() {
        debug!(root = root_path, "root folder missing");
        return ProvisionOutcome::new(
            ProvisionStatus::MissingRoot,
            format!("Root folder {} does not exist", root_path),
        );
    }

    let target = Path::new(target_path);
    if target.is_dir() {
        return ProvisionOutcome::new(ProvisionStatus::AlreadyExists, "Folder already existed");
    }

    match create_target(target) {
        Ok(()) => {
            debug!(target = target_path, "created folder");
            ProvisionOutcome::new(ProvisionStatus::Created, "Created Successfully")
        }
        Err(err) => {
            warn!(
                root = root_path,
                target = target_path,
                error = %err,
                "folder creation failed"
            );
            ProvisionOutcome::new(ProvisionStatus::CreateFailed, "Error while creating folder")
        }
    }
}

// `create_dir_all("")` succeeds without touching the filesystem, so an empty
// target has to be rejected here to be reported as a failed creation.
fn create_target(target: &Path) -> io::Result<()> {
    if target.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "empty target path"));
    }
    fs::create_dir_all(target)
}
