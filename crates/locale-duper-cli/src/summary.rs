use colored::*;
use indicatif::HumanDuration;
use locale_duper_core::stats::DuplicationStats;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Succeeded")]
    successful: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
    #[tabled(rename = "Total")]
    total: usize,
}

pub fn render_table(stats: &DuplicationStats) -> String {
    let rows: Vec<ModelRow> = stats
        .models
        .iter()
        .map(|m| ModelRow {
            model: m.model_name.clone(),
            successful: m.successful,
            failed: m.failed,
            total: m.total,
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn print_summary(stats: &DuplicationStats, show_errors: bool) {
    println!();
    if stats.all_succeeded() {
        println!(
            "{} {} records duplicated across {} models",
            "✓".green().bold(),
            format!("{}", stats.successful_records).green(),
            stats.total_models,
        );
    } else {
        println!(
            "{} {} of {} records failed ({} succeeded)",
            "✗".red().bold(),
            format!("{}", stats.failed_records).red(),
            stats.total_records,
            format!("{}", stats.successful_records).green(),
        );
    }

    if !stats.models.is_empty() {
        println!("{}", render_table(stats));
    }

    let duration = stats.duration().to_std().unwrap_or_default();
    println!(
        "Started {}, took {}",
        stats.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        HumanDuration(duration)
    );

    if show_errors && !stats.errors.is_empty() {
        println!();
        println!("{}", "Errors:".red().bold());
        for err in &stats.errors {
            println!("  [{}] {}", err.model_name.cyan(), err.message);
        }
    } else if !stats.errors.is_empty() {
        println!("Run with --show-errors to list the failed records.");
    }
}
