//! Output formatting for human and JSON modes.

use std::fmt::Write;
use std::sync::Arc;

use runscope_core::{Error, HistoryRow, MediaFile, Run, Value};
use runscope_engine::MetricSeries;
use serde::Serialize;

/// Output style selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {}\"}}", e))
}

/// Render a value the way a user would type it
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

pub fn format_runs(runs: &[Arc<Run>], mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        let runs: Vec<&Run> = runs.iter().map(|r| r.as_ref()).collect();
        return to_json(&runs);
    }
    if runs.is_empty() {
        return "(no runs)".to_string();
    }

    let mut out = format!(
        "{:<12} {:<19} {:<10} {:<5} {}",
        "ID", "CREATED", "STATE", "MEDIA", "NAME"
    );
    for run in runs {
        let created = run
            .created_at
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = write!(
            out,
            "\n{:<12} {:<19} {:<10} {:<5} {}",
            run.id,
            created,
            run.state().unwrap_or(if run.is_offline { "offline" } else { "-" }),
            if run.has_media { "yes" } else { "no" },
            run.display_name
        );
    }
    out
}

pub fn format_run(run: &Run, mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return to_json(run);
    }

    let mut out = String::new();
    let _ = writeln!(out, "id:           {}", run.id);
    let _ = writeln!(out, "display name: {}", run.display_name);
    let _ = writeln!(out, "name:         {}", run.name);
    let _ = writeln!(out, "directory:    {}", run.directory.display());
    match &run.log_file_path {
        Some(path) => {
            let _ = writeln!(out, "log file:     {}", path.display());
        }
        None => {
            let _ = writeln!(out, "log file:     (none)");
        }
    }
    let _ = writeln!(out, "offline:      {}", run.is_offline);
    if let Some(created) = run.created_at {
        let _ = writeln!(out, "created:      {}", created);
    }
    if let Some(host) = run.host() {
        let _ = writeln!(out, "host:         {}", host);
    }
    if let Some(state) = run.state() {
        let _ = writeln!(out, "state:        {}", state);
    }
    let _ = writeln!(out, "has media:    {}", run.has_media);

    out.push_str("\nconfig:\n");
    let mut keys = std::collections::BTreeSet::new();
    Value::Object(run.config.clone()).collect_leaf_paths("", &mut keys);
    for key in &keys {
        if let Some(value) = run.config_value(key) {
            let _ = writeln!(out, "  {} = {}", key, render_value(value));
        }
    }

    if let Some(summary) = &run.summary {
        out.push_str("\nsummary:\n");
        for (key, value) in summary {
            let _ = writeln!(out, "  {} = {}", key, render_value(value));
        }
    }
    out.trim_end().to_string()
}

pub fn format_history(rows: &[HistoryRow], mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return to_json(rows);
    }
    if rows.is_empty() {
        return "(no history)".to_string();
    }
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|(k, v)| format!("{}={}", k, render_value(v)))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_metrics(series: &MetricSeries, mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return to_json(series);
    }
    if series.is_empty() {
        return "(no metrics)".to_string();
    }

    let columns: Vec<(&str, &[Value])> = series.iter().collect();
    let mut out = columns
        .iter()
        .map(|(key, _)| *key)
        .collect::<Vec<_>>()
        .join("\t");
    for row in 0..series.row_count() {
        out.push('\n');
        let line = columns
            .iter()
            .map(|(_, column)| column.get(row).map(render_value).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\t");
        out.push_str(&line);
    }
    out
}

pub fn format_keys(keys: &[String], mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return to_json(keys);
    }
    if keys.is_empty() {
        return "(none)".to_string();
    }
    keys.join("\n")
}

pub fn format_media(files: &[MediaFile], mode: OutputMode) -> String {
    if mode == OutputMode::Json {
        return to_json(files);
    }
    if files.is_empty() {
        return "(no media)".to_string();
    }
    files
        .iter()
        .map(|file| {
            let epoch = file
                .epoch
                .map(|e| e.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!("{:>6}  {}", epoch, file.relative_path.display())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => to_json(&serde_json::json!({ "error": err.to_string() })),
        OutputMode::Human => format!("(error) {}", err),
    }
}
