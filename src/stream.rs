use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::record::{Layout, Record};
use crate::tool::{DirectoryCreateTool, RunSummary};

/// Drive `tool` over a JSON Lines stream, writing each processed row as soon
/// as it is produced.
///
/// The first row fixes the layout; a configuration error therefore surfaces
/// before anything is written. `total_bytes`, when known, feeds progress
/// reporting.
pub fn run_stream<R, W>(
    reader: R,
    mut writer: W,
    mut tool: DirectoryCreateTool,
    total_bytes: Option<u64>,
) -> Result<RunSummary>
where
    R: BufRead,
    W: Write,
{
    let mut initialized = false;
    let mut consumed: u64 = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("reading input line {line_no}"))?;
        consumed += line.len() as u64 + 1;
        if line.trim().is_empty() {
            continue;
        }

        let record = parse_record(&line, line_no)?;
        if !initialized {
            tool.init(&Layout::from_record(&record))
                .context("initializing from the first input row")?;
            initialized = true;
        }

        let out = tool
            .push_record(record)
            .with_context(|| format!("processing input line {line_no}"))?;
        serde_json::to_writer(&mut writer, &out.into_map())
            .with_context(|| format!("writing output row for line {line_no}"))?;
        writer
            .write_all(b"\n")
            .with_context(|| format!("writing output row for line {line_no}"))?;

        if let Some(total) = total_bytes.filter(|total| *total > 0) {
            tool.update_progress(consumed as f64 / total as f64);
        }
    }

    writer.flush().context("flushing output")?;
    tool.update_progress(1.0);
    Ok(tool.close())
}

fn parse_record(line: &str, line_no: usize) -> Result<Record> {
    let value: Value = serde_json::from_str(line)
        .with_context(|| format!("parsing input line {line_no} as JSON"))?;
    match value {
        Value::Object(map) => Ok(Record::from_map(map)),
        other => bail!(
            "input line {line_no} is not a JSON object (found {})",
            kind_of(&other)
        ),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
