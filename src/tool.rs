use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Result, anyhow, bail};
use tracing::{debug, info};

use crate::provision::{ProvisionStatus, provision};
use crate::record::{
    DEFAULT_FIELD_SIZE, DESCRIPTION_FIELD, FieldInfo, Layout, OutputLayout, RESULT_FIELD, Record,
    truncate_to,
};

/// Resolved settings the tool runs with. Both field selections are mandatory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolSettings {
    pub root_folder_field: String,
    pub target_folder_field: String,
    pub description_size: usize,
    pub tool_id: u32,
}

impl ToolSettings {
    pub fn appended_fields(&self) -> Vec<FieldInfo> {
        vec![
            FieldInfo::result(self.tool_id, DEFAULT_FIELD_SIZE),
            FieldInfo::description(self.tool_id, self.description_size),
        ]
    }
}

/// Per-run counters reported when the input is closed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records: u64,
    pub by_status: BTreeMap<&'static str, u64>,
}

impl RunSummary {
    fn record(&mut self, status: ProvisionStatus) {
        self.records += 1;
        *self.by_status.entry(status.as_str()).or_default() += 1;
    }

    pub fn count(&self, status: ProvisionStatus) -> u64 {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }

    pub fn failures(&self) -> u64 {
        self.count(ProvisionStatus::MissingRoot) + self.count(ProvisionStatus::CreateFailed)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records: {} created, {} already existed, {} missing root, {} failed",
            self.records,
            self.count(ProvisionStatus::Created),
            self.count(ProvisionStatus::AlreadyExists),
            self.count(ProvisionStatus::MissingRoot),
            self.count(ProvisionStatus::CreateFailed),
        )
    }
}

/// Push-style row processor: `init` once, `push_record` per row, then `close`.
#[derive(Debug)]
pub struct DirectoryCreateTool {
    settings: ToolSettings,
    output: Option<OutputLayout>,
    summary: RunSummary,
}

impl DirectoryCreateTool {
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            settings,
            output: None,
            summary: RunSummary::default(),
        }
    }

    /// Validate the incoming layout and describe the outgoing one.
    pub fn init(&mut self, layout: &Layout) -> Result<OutputLayout> {
        self.check_columns(|name| layout.index_of(name).is_some())?;

        let output = OutputLayout {
            passthrough: layout.clone(),
            appended: self.settings.appended_fields(),
        };
        debug!(columns = ?output.column_names(), "output layout ready");
        self.output = Some(output.clone());
        Ok(output)
    }

    /// Provision the folder named by one row and return the row with the two
    /// status columns appended.
    ///
    /// Every row must carry both configured columns and neither appended one;
    /// otherwise the appended values would overwrite pass-through data.
    pub fn push_record(&mut self, mut record: Record) -> Result<Record> {
        if self.output.is_none() {
            return Err(anyhow!("record pushed before the tool was initialized"));
        }
        self.check_columns(|name| record.get(name).is_some())?;

        let root = record.field_as_string(&self.settings.root_folder_field);
        let target = record.field_as_string(&self.settings.target_folder_field);
        let outcome = provision(&root, &target);
        self.summary.record(outcome.status);

        record.append(RESULT_FIELD, outcome.result_text());
        record.append(
            DESCRIPTION_FIELD,
            truncate_to(&outcome.message, self.settings.description_size),
        );
        Ok(record)
    }

    fn check_columns(&self, has_column: impl Fn(&str) -> bool) -> Result<()> {
        let roles = [
            ("root folder", &self.settings.root_folder_field),
            ("target folder", &self.settings.target_folder_field),
        ];
        for (role, field) in roles {
            if !has_column(field.as_str()) {
                bail!("{role} field `{field}` does not exist on input columns");
            }
        }
        for appended in [RESULT_FIELD, DESCRIPTION_FIELD] {
            if has_column(appended) {
                bail!("input already has a `{appended}` column");
            }
        }
        Ok(())
    }

    pub fn update_progress(&self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        debug!(
            percent = fraction * 100.0,
            records = self.summary.records,
            "progress"
        );
    }

    pub fn close(self) -> RunSummary {
        info!("{}", self.summary);
        self.summary
    }
}
