//! Output formatting for CLI commands
//!
//! Every command can print JSON, YAML or a plain table.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{PurgeResult, StatsSnapshot, ZoneInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    #[default]
    Table,
}

pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

pub fn print_yaml<T: Serialize>(data: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(data).context("Failed to serialize to YAML")?;
    println!("{}", yaml);
    Ok(())
}

/// Print structured formats; returns `false` when the caller must draw a table
fn print_structured<T: Serialize>(data: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => print_json(data).map(|_| true),
        OutputFormat::Yaml => print_yaml(data).map(|_| true),
        OutputFormat::Table => Ok(false),
    }
}

/// Truncate string to maximum length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn print_table_header(columns: &[(&str, usize)]) {
    println!();
    let mut header = String::new();
    for (name, width) in columns {
        header.push_str(&format!("{:<width$} ", name, width = width));
    }
    println!("{}", header.trim());

    let total_width: usize = columns.iter().map(|(_, w)| w + 1).sum();
    println!("{}", "-".repeat(total_width.saturating_sub(1)));
}

pub fn print_purge_result(result: &PurgeResult, format: OutputFormat) -> Result<()> {
    if print_structured(result, format)? {
        return Ok(());
    }

    let status = match (result.success(), result.was_cancelled()) {
        (true, false) => "purged",
        (true, true) => "partially purged (cancelled)",
        (false, _) => "failed",
    };
    println!("Provider:          {}", result.provider());
    println!("Status:            {}", status);
    println!("Chunks attempted:  {}", result.chunks_attempted());
    println!("Chunks failed:     {}", result.chunks_failed());
    println!("Duration:          {}ms", result.duration_ms());
    if let Some(error) = result.error() {
        println!("Error:             [{}] {}", error.kind, error.message);
    }
    Ok(())
}

pub fn print_zones(zones: &[ZoneInfo], format: OutputFormat) -> Result<()> {
    if print_structured(&zones, format)? {
        return Ok(());
    }
    if zones.is_empty() {
        println!("No zones found");
        return Ok(());
    }

    print_table_header(&[("ID", 34), ("Name", 40), ("Status", 12)]);
    for zone in zones {
        let status = match &zone.status {
            crate::domain::ZoneStatus::Active => "active",
            crate::domain::ZoneStatus::Other(other) => other.as_str(),
        };
        println!(
            "{:<34} {:<40} {:<12}",
            truncate(&zone.id, 34),
            truncate(&zone.name, 40),
            truncate(status, 12)
        );
    }
    println!();
    Ok(())
}

pub fn print_stats(stats: &StatsSnapshot, format: OutputFormat) -> Result<()> {
    if print_structured(stats, format)? {
        return Ok(());
    }

    println!(
        "Window:            {} .. {}",
        stats.window_start.format("%Y-%m-%d %H:%M"),
        stats.window_end.format("%Y-%m-%d %H:%M")
    );
    println!("Requests:          {}", stats.requests_total);
    println!("Bandwidth:         {}", human_bytes(stats.bandwidth_total_bytes));
    println!("Cache hit ratio:   {:.2}%", stats.cache_hit_ratio_percent);
    println!("Threats blocked:   {}", stats.threats_blocked);
    Ok(())
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProviderKind, ZoneStatus};

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 3), "...");
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512 B");
        assert_eq!(human_bytes(1536), "1.5 KiB");
        assert_eq!(human_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }

    #[test]
    fn test_printers_accept_every_format() {
        let result = PurgeResult::completed(ProviderKind::None, 1);
        let zones = vec![ZoneInfo::new("1", "example.com", ZoneStatus::Active)];
        for format in [OutputFormat::Json, OutputFormat::Yaml, OutputFormat::Table] {
            assert!(print_purge_result(&result, format).is_ok());
            assert!(print_zones(&zones, format).is_ok());
        }
    }
}
