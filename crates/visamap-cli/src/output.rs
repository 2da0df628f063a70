//! Output renderers for CLI commands.

use anyhow::anyhow;
use serde::Serialize;
use visamap_api_models::{LookupResponse, PolicyView, PublishResponse};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_policy_list(entries: &[PolicyView], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Table => {
            println!("{:<24} {:<24} {:>4} {:>6} LABEL", "ORIGIN", "DESTINATION", "CODE", "DAYS");
            for entry in entries {
                println!("{}", policy_row(entry));
            }
            println!("{} entries", entries.len());
        }
    }
    Ok(())
}

pub(crate) fn render_policy(entry: &PolicyView, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(entry)?,
        OutputFormat::Table => println!("stored: {}", policy_row(entry)),
    }
    Ok(())
}

pub(crate) fn render_publish(report: &PublishResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(report)?,
        OutputFormat::Table => {
            println!(
                "published {} passports ({} entries) at {}",
                report.passports, report.total_entries, report.published_at
            );
        }
    }
    Ok(())
}

pub(crate) fn render_lookup(found: &LookupResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(found)?,
        OutputFormat::Table => {
            println!("{} -> {}", found.origin, found.destination);
            println!("policy: {}", lookup_policy(found));
            match found.duration_days {
                Some(0) | None => println!("duration: -"),
                Some(days) => println!("duration: {days} days"),
            }
        }
    }
    Ok(())
}

fn policy_row(entry: &PolicyView) -> String {
    format!(
        "{:<24} {:<24} {:>4} {:>6} {}",
        entry.origin,
        entry.destination,
        entry.policy_code,
        entry.duration_days,
        entry.policy_label().unwrap_or("unknown")
    )
}

fn lookup_policy(found: &LookupResponse) -> String {
    match (&found.policy_label, found.policy_code) {
        (Some(label), Some(code)) => format!("{label} ({code})"),
        (None, Some(code)) => code.to_string(),
        _ => "no data".to_string(),
    }
}
