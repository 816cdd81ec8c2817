use chrono::Local;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use locale_duper_core::{DuplicationStats, ProgressUpdate, UpdateKind};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Consume the engine's progress stream: print the log lines above a progress
/// bar and fold every update into the run statistics.
pub async fn watch_progress(mut rx: UnboundedReceiver<ProgressUpdate>) -> DuplicationStats {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template(
            "  {spinner:.cyan} [{bar:30.cyan/dim}] {pos:>3}% {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    bar.enable_steady_tick(Duration::from_millis(80));

    let mut stats = DuplicationStats::new();

    while let Some(update) = rx.recv().await {
        stats.apply(&update);

        if let Some(progress) = update.progress {
            bar.set_position(u64::from(progress));
        }
        if let Some(line) = format_line(&update) {
            bar.println(line);
        }
        if update.is_record_outcome() {
            bar.set_message(format!(
                "{} written, {} failed",
                stats.successful_records, stats.failed_records
            ));
        }
    }

    bar.finish_and_clear();
    stats.finish();
    stats
}

fn format_line(update: &ProgressUpdate) -> Option<String> {
    let message = update.display_message()?;
    let time = update.timestamp.with_timezone(&Local).format("%H:%M:%S");
    let marker = match update.kind {
        UpdateKind::Info => style("•").cyan(),
        UpdateKind::Success => style("✓").green(),
        UpdateKind::Error => style("✗").red(),
    };
    Some(format!("  {} {} {}", style(time).dim(), marker, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_signal_has_no_line() {
        let mut update = ProgressUpdate::success("");
        update.record_id = Some("r1".to_string());
        assert!(format_line(&update).is_none());
    }

    #[test]
    fn test_line_contains_message() {
        let line = format_line(&ProgressUpdate::error("Process aborted by user")).unwrap();
        assert!(line.contains("Process aborted by user"));
    }

    #[tokio::test]
    async fn test_watch_progress_folds_updates() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let mut first = ProgressUpdate::success("");
        first.model_id = Some("m1".to_string());
        first.record_id = Some("r1".to_string());
        tx.send(ProgressUpdate::info("Found 1 models to process").with_progress(5))
            .unwrap();
        tx.send(first.clone()).unwrap();
        tx.send(first).unwrap();
        drop(tx);

        let stats = watch_progress(rx).await;
        assert_eq!(stats.successful_records, 1);
        assert!(stats.finished_at.is_some());
    }
}
