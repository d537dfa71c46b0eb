// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use lh_engine::{PhaseStatus, RunSummary, TaskReport};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Run summary rendered as a task table for humans, or as-is for JSON
#[derive(Serialize)]
#[serde(transparent)]
pub struct SummaryView<'a>(pub &'a RunSummary);

impl fmt::Display for SummaryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        writeln!(
            f,
            "semaphore {} (capacity {}){}",
            summary.semaphore,
            summary.capacity,
            if summary.interrupted { ", interrupted" } else { "" }
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "{:<10} {:<18} {:<38} {:>9} {:>9} {:>8}  DETAIL",
            "TASK", "OUTCOME", "PERMIT", "WAITED", "HELD", "RENEWALS"
        )?;
        for report in &summary.tasks {
            write_task(f, report)?;
        }
        writeln!(f)?;

        let counts = &summary.counts;
        writeln!(
            f,
            "{} tasks: {} completed, {} no slot, {} store unavailable, {} failed, {} interrupted",
            counts.total(),
            counts.completed,
            counts.no_slot,
            counts.store_unavailable,
            counts.failed,
            counts.interrupted
        )?;
        let beats = &summary.heartbeats;
        writeln!(
            f,
            "heartbeats: {} renewed, {} rejected, {} faulted, {} skipped",
            beats.renewed, beats.rejected, beats.faulted, beats.skipped
        )?;

        let phases: Vec<String> = summary
            .shutdown
            .phases
            .iter()
            .map(|p| match &p.status {
                PhaseStatus::Clean => format!("{} clean", p.phase),
                PhaseStatus::TimedOut { abandoned } => {
                    format!("{} timed out ({} abandoned)", p.phase, abandoned)
                }
                PhaseStatus::Failed { reason } => format!("{} failed ({})", p.phase, reason),
            })
            .collect();
        write!(
            f,
            "shutdown: {} in {}",
            phases.join(", "),
            format_ms(summary.elapsed_ms)
        )
    }
}

fn write_task(f: &mut fmt::Formatter<'_>, report: &TaskReport) -> fmt::Result {
    let permit = report
        .permit
        .as_ref()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    let held = report
        .held_ms
        .map(format_ms)
        .unwrap_or_else(|| "-".to_string());
    writeln!(
        f,
        "{:<10} {:<18} {:<38} {:>9} {:>9} {:>8}  {}",
        report.task.to_string(),
        report.outcome.as_str(),
        permit,
        format_ms(report.waited_ms),
        held,
        report.renewals.renewed,
        report.detail.as_deref().unwrap_or("")
    )
}

/// `1234` -> `1.2s`, `950` -> `950ms`
fn format_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
