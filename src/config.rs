use std::fmt::Write as _;
use std::fs;

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use serde::Deserialize;
use toml_edit::{DocumentMut, value};

use crate::record::DEFAULT_FIELD_SIZE;
use crate::templates;
use crate::tool::ToolSettings;

/// Configuration document, by default `.dircreate/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct DircreateConfig {
    pub root_folder_field: Option<String>,
    pub target_folder_field: Option<String>,
    pub description_size: Option<usize>,
    pub tool_id: Option<u32>,
}

/// Field selections passed on the command line; they take precedence.
#[derive(Debug, Default)]
pub struct FieldOverrides {
    pub root_folder_field: Option<String>,
    pub target_folder_field: Option<String>,
}

impl DircreateConfig {
    /// Merge with CLI overrides into settings the tool can run with.
    pub fn resolve(&self, overrides: &FieldOverrides) -> Result<ToolSettings> {
        let root = pick(&overrides.root_folder_field, &self.root_folder_field);
        let target = pick(&overrides.target_folder_field, &self.target_folder_field);

        let (root, target) = match (root, target) {
            (None, _) => bail!("Please select the root folder field"),
            (_, None) => bail!("Please select the target folder field"),
            (Some(root), Some(target)) => (root, target),
        };

        Ok(ToolSettings {
            root_folder_field: root,
            target_folder_field: target,
            description_size: self.description_size()?,
            tool_id: self.tool_id(),
        })
    }

    pub fn description_size(&self) -> Result<usize> {
        let size = self.description_size.unwrap_or(DEFAULT_FIELD_SIZE);
        if size == 0 {
            bail!("description_size must be greater than zero");
        }
        Ok(size)
    }

    pub fn tool_id(&self) -> u32 {
        self.tool_id.unwrap_or(1)
    }
}

fn pick(primary: &Option<String>, fallback: &Option<String>) -> Option<String> {
    primary
        .as_deref()
        .or(fallback.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}

/// Load a configuration file from disk and deserialize it.
pub fn load_from_path(path: &Utf8Path) -> Result<DircreateConfig> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path))
}

/// Like [`load_from_path`], but a missing file yields an empty config.
pub fn load_or_default(path: &Utf8Path) -> Result<DircreateConfig> {
    if path.exists() {
        load_from_path(path)
    } else {
        Ok(DircreateConfig::default())
    }
}

pub fn write_example_config(path: &Utf8Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!("{} already exists; rerun with --force to overwrite", path);
    }

    templates::write_template(path, "config/example.config.toml")
}

/// Update the field selections in place, keeping the rest of the document.
pub fn set_fields(path: &Utf8Path, root: Option<&str>, target: Option<&str>) -> Result<()> {
    if root.is_none() && target.is_none() {
        bail!("nothing to set; pass --root-field and/or --target-field");
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating directory {}", parent))?;
    }

    let mut doc: DocumentMut = if path.exists() {
        let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        raw.parse()
            .with_context(|| format!("parsing config {}", path))?
    } else {
        DocumentMut::new()
    };

    if let Some(root) = root {
        doc["root_folder_field"] = value(root);
    }
    if let Some(target) = target {
        doc["target_folder_field"] = value(target);
    }

    fs::write(path, doc.to_string()).with_context(|| format!("writing config {}", path))
}

pub fn format_summary(config: &DircreateConfig) -> String {
    let mut out = String::new();
    let root = config.root_folder_field.as_deref().unwrap_or("<unset>");
    let target = config.target_folder_field.as_deref().unwrap_or("<unset>");
    let size = config.description_size.unwrap_or(DEFAULT_FIELD_SIZE);
    let tool_id = config.tool_id();

    let _ = writeln!(out, "Root folder field: {}", root);
    let _ = writeln!(out, "Target folder field: {}", target);
    let _ = writeln!(out, "Description size: {}", size);
    let _ = write!(out, "Tool id: {}", tool_id);
    out
}
