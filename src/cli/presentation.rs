//! CLI presentation: text and json formatters per command.

use crate::export::ExportReport;
use crate::tree::{Child, Content, Entry, Resolved};
use crate::types::{hash_hex, short_hex};
use owo_colors::OwoColorize;
use serde_json::json;

fn heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Mode name, or the raw octal mode when it does not decode
fn child_mode(child: &Child) -> String {
    match child.entry() {
        Ok(entry) => entry.mode.as_str().to_string(),
        Err(_) => format!("0{:o}", child.raw_mode),
    }
}

pub fn format_report_text(report: &ExportReport, destination: &str) -> String {
    let status = if report.is_noop() {
        format!("{}", "up to date".dimmed())
    } else {
        format!("{}", "exported".green())
    };
    let mut out = format!("{} {}\n", heading("Export"), status);
    out.push_str(&format!("  destination:       {}\n", destination));
    out.push_str(&format!("  directories:       {}\n", report.directories));
    out.push_str(&format!(
        "  files written:     {} ({} bytes)\n",
        report.files_written, report.bytes_written
    ));
    out.push_str(&format!("  files unchanged:   {}\n", report.files_skipped));
    if report.dangling_symlinks > 0 {
        out.push_str(&format!(
            "  dangling symlinks: {}\n",
            report.dangling_symlinks.yellow()
        ));
    }
    out.push_str(&format!("  elapsed:           {} ms", report.elapsed_ms));
    out
}

pub fn format_report_json(report: &ExportReport, destination: &str) -> String {
    let value = json!({
        "destination": destination,
        "directories": report.directories,
        "files_written": report.files_written,
        "files_skipped": report.files_skipped,
        "dangling_symlinks": report.dangling_symlinks,
        "bytes_written": report.bytes_written,
        "elapsed_ms": report.elapsed_ms,
        "finished_at": report.finished_at.to_rfc3339(),
    });
    format!("{:#}", value)
}

pub fn format_roots_text(roots: &[(String, Entry)]) -> String {
    if roots.is_empty() {
        return "No roots. Run `treexport snapshot <DIR> --root <NAME>` to import one.".to_string();
    }
    let mut out = heading("Roots");
    for (name, entry) in roots {
        out.push_str(&format!(
            "\n  {:<24} {:<7} {}",
            name,
            entry.mode.as_str(),
            short_hex(&entry.hash).dimmed()
        ));
    }
    out
}

pub fn format_roots_json(roots: &[(String, Entry)]) -> String {
    let value: Vec<_> = roots
        .iter()
        .map(|(name, entry)| {
            json!({
                "name": name,
                "mode": entry.mode.as_str(),
                "hash": hash_hex(&entry.hash),
            })
        })
        .collect();
    format!("{:#}", serde_json::Value::Array(value))
}

pub fn format_entry_text(path: &str, resolved: &Resolved) -> String {
    let entry = &resolved.entry;
    let mut out = format!(
        "{} {} {}",
        heading(path),
        entry.mode.as_str(),
        hash_hex(&entry.hash).dimmed()
    );
    match &resolved.content {
        Content::Tree(children) => {
            for (name, child) in children {
                out.push_str(&format!(
                    "\n  {:<7} {}  {}",
                    child_mode(child),
                    short_hex(&child.hash).dimmed(),
                    name
                ));
            }
        }
        Content::Link(target) => out.push_str(&format!("\n  -> {}", target.cyan())),
        Content::Blob => {}
    }
    out
}

pub fn format_entry_json(path: &str, resolved: &Resolved) -> String {
    let entry = &resolved.entry;
    let mut value = json!({
        "path": path,
        "mode": entry.mode.as_str(),
        "hash": hash_hex(&entry.hash),
    });
    match &resolved.content {
        Content::Tree(children) => {
            let children: serde_json::Map<_, _> = children
                .iter()
                .map(|(name, child)| {
                    (
                        name.clone(),
                        json!({ "mode": child_mode(child), "hash": hash_hex(&child.hash) }),
                    )
                })
                .collect();
            value["children"] = serde_json::Value::Object(children);
        }
        Content::Link(target) => value["target"] = json!(target),
        Content::Blob => {}
    }
    format!("{:#}", value)
}
