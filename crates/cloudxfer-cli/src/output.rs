use std::sync::Arc;

use cloudxfer_core::domain::{format_eta, format_size, format_speed, TransferStats};
use cloudxfer_engine::{BatchReport, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn warn(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &serde_json::Value);
}

/// Human-readable output formatter with checkmarks and indentation
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn warn(&self, message: &str) {
        eprintln!("\u{26a0} Warning: {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn print_json(&self, _value: &serde_json::Value) {}
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!(
            "{}",
            serde_json::json!({"success": true, "message": message})
        );
    }
    fn error(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"success": false, "error": message})
        );
    }
    fn warn(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"level": "warning", "message": message})
        );
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
}

pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}

// ============================================================================
// Progress
// ============================================================================

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}";

fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

fn file_counts(stats: &TransferStats) -> String {
    format!("{}/{} files", stats.files_completed, stats.files_total)
}

/// Progress bar on stderr for interactive runs
///
/// Returns `None` when progress should not be shown (JSON output or quiet).
/// The stderr draw target rate-limits redraws and stays silent when stderr
/// is not a terminal.
pub fn progress_printer(format: OutputFormat, quiet: bool) -> Option<ProgressCallback> {
    if quiet || format == OutputFormat::Json {
        return None;
    }
    let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
    bar.set_style(progress_style());
    Some(bar_callback(bar))
}

/// Mirrors each tracker snapshot onto `bar`
fn bar_callback(bar: ProgressBar) -> ProgressCallback {
    Arc::new(move |stats: &TransferStats| {
        if bar.is_finished() {
            return;
        }
        bar.set_length(stats.total_bytes);
        bar.set_position(stats.transferred_bytes);
        bar.set_message(file_counts(stats));
        if stats.is_complete() {
            bar.finish();
        }
    })
}

// ============================================================================
// Batch reports
// ============================================================================

fn plural(n: u32) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// JSON document for a finished batch
pub fn report_json(report: &BatchReport) -> serde_json::Value {
    let failures: Vec<_> = report
        .failures()
        .map(|r| {
            serde_json::json!({
                "local": r.item.local_path.display().to_string(),
                "remote": r.item.remote_path.to_string(),
                "error": r.outcome.to_string(),
            })
        })
        .collect();
    serde_json::json!({
        "succeeded": report.summary.succeeded,
        "skipped": report.summary.skipped,
        "failed": report.summary.failed,
        "bytes": report.stats.transferred_bytes,
        "elapsed_ms": report.stats.elapsed().as_millis() as u64,
        "failures": failures,
    })
}

/// Prints a finished batch in the requested format
pub fn print_report(fmt: &dyn OutputFormatter, format: OutputFormat, verb: &str, report: &BatchReport) {
    if format == OutputFormat::Json {
        fmt.print_json(&report_json(report));
        return;
    }

    let summary = &report.summary;
    let elapsed = report.stats.elapsed();
    fmt.success(&format!(
        "{} {} file{} in {}",
        verb,
        summary.succeeded,
        plural(summary.succeeded),
        format_eta(elapsed)
    ));
    fmt.info(&format!(
        "Transferred: {} ({})",
        format_size(report.stats.transferred_bytes),
        format_speed(report.stats.speed_over(elapsed))
    ));
    if summary.skipped > 0 {
        fmt.info(&format!("Skipped:     {} file{}", summary.skipped, plural(summary.skipped)));
    }
    if summary.failed > 0 {
        fmt.error(&format!("{} file{} failed:", summary.failed, plural(summary.failed)));
        for failure in report.failures() {
            fmt.info(&format!("  - {}: {}", failure.item.display_name(), failure.outcome));
        }
    }
}
