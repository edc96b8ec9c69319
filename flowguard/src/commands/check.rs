// flowguard/src/commands/check.rs

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};
use tracing::info;

use crate::cli::OutputFormat;
use crate::driver::{self, DriverOutput};

pub async fn run(project_dir: &Path, format: OutputFormat) -> Result<()> {
    info!(project = %project_dir.display(), "running auto-test driver");
    let output = driver::run(project_dir).await?;
    driver::write_reports(project_dir, &output)?;

    match format {
        OutputFormat::Json => print_json(&output)?,
        OutputFormat::Text => print_summary_table(&output),
    }

    Ok(())
}

fn print_json(output: &DriverOutput) -> Result<()> {
    let combined = serde_json::json!({
        "compatibility": output.compatibility,
        "quality": output.quality,
    });
    println!("{}", serde_json::to_string_pretty(&combined)?);
    Ok(())
}

fn print_summary_table(output: &DriverOutput) {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);

    table.add_row(vec![Cell::new("Files discovered"), Cell::new(output.compatibility.summary.total_files.to_string())]);
    table.add_row(vec![Cell::new("Parse success rate"), Cell::new(format!("{}%", output.compatibility.summary.parse.success_rate_pct))]);
    table.add_row(vec![Cell::new("Normalize success rate"), Cell::new(format!("{}%", output.compatibility.summary.normalize.success_rate_pct))]);
    table.add_row(vec![Cell::new("Compatibility verdict"), Cell::new(format!("{:?}", output.compatibility.compatibility_verdict))]);
    table.add_row(vec![Cell::new("Quality score"), Cell::new(output.quality.summary.quality_score.to_string())]);
    table.add_row(vec![Cell::new("Quality verdict"), Cell::new(format!("{:?}", output.quality.summary.quality_verdict))]);
    table.add_row(vec![Cell::new("Errors / Warnings / Info"), Cell::new(format!(
        "{} / {} / {}",
        output.quality.summary.errors, output.quality.summary.warnings, output.quality.summary.info
    ))]);

    println!("{table}");
}
