//! Colored formatter built on top of the plain implementation
//!
//! Wraps the plain formatter and applies ANSI colors keyed to the perceived
//! quality of each metric, so a glance at the summary shows where the
//! network path is hurting.

use super::formatter::{FormattingOptions, OutputFormatter, PlainFormatter};
use crate::error::Result;
use crate::models::{JitterResult, ThroughputResult, VideoResult};
use crate::registry::RegistrySnapshot;
use crate::types::QualityLevel;
use colored::*;

/// Color keyed to a MOS quality classification
fn quality_color(level: QualityLevel) -> Color {
    match level {
        QualityLevel::Excellent => Color::Green,
        QualityLevel::Good => Color::Cyan,
        QualityLevel::Fair => Color::Yellow,
        QualityLevel::Poor => Color::Red,
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain: PlainFormatter,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self {
            plain: PlainFormatter::new(options),
        }
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let underline = "=".repeat(title.len());
        Ok(format!("{}\n{}", title.bold().cyan(), underline.cyan()))
    }

    fn format_jitter_result(&self, result: &JitterResult) -> Result<String> {
        let quality = result.quality();
        let score = format!("{:.2} ({})", result.mos, quality)
            .color(quality_color(quality))
            .bold();
        Ok(format!(
            "{} {} | jitter {:.2} ms | loss {:.2}% | RTT {:.0} ms",
            "Jitter/MOS:".bold(),
            score,
            result.jitter_ms,
            result.packet_loss_pct,
            result.rtt_ms
        ))
    }

    fn format_throughput_result(&self, result: &ThroughputResult) -> Result<String> {
        if result.success {
            Ok(format!(
                "{} {} down | {} up | RTT {:.0} ms | via {}",
                "Throughput:".bold(),
                format!("{:.2} Mbps", result.download_mbps).green().bold(),
                format!("{:.2} Mbps", result.upload_mbps).green(),
                result.rtt_ms,
                result.endpoint.as_deref().unwrap_or("-").dimmed()
            ))
        } else {
            Ok(format!(
                "{} {}",
                "Throughput:".bold(),
                format!("all {} endpoints failed", result.attempts).red()
            ))
        }
    }

    fn format_video_result(&self, result: &VideoResult) -> Result<String> {
        // Rebuffering beyond a couple of percent is already disruptive
        let ratio = format!("{:.2}%", result.rebuffer_ratio_pct);
        let ratio = if result.rebuffer_ratio_pct <= 2.0 {
            ratio.green()
        } else if result.rebuffer_ratio_pct <= 10.0 {
            ratio.yellow()
        } else {
            ratio.red()
        };
        Ok(format!(
            "{} initial latency {:.0} ms | buffering {:.1} s | rebuffer ratio {}",
            "Video:".bold(),
            result.initial_latency_ms,
            result.total_buffering_ms / 1000.0,
            ratio
        ))
    }

    fn format_summary_table(&self, snapshot: &RegistrySnapshot) -> Result<String> {
        // Table alignment breaks with embedded escape codes; the table body
        // stays plain and only the surrounding chrome is colored.
        self.plain.format_summary_table(snapshot)
    }

    fn format_error(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", "ERROR:".red().bold(), message.red()))
    }

    fn format_warning(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", "WARNING:".yellow().bold(), message.yellow()))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("{} {}", "OK:".green().bold(), message.green()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeasurementSample;

    #[test]
    fn test_quality_colors() {
        assert_eq!(quality_color(QualityLevel::Excellent), Color::Green);
        assert_eq!(quality_color(QualityLevel::Poor), Color::Red);
    }

    #[test]
    fn test_colored_jitter_line_contains_metrics() {
        let formatter = ColoredFormatter::new(FormattingOptions::default());
        let result = JitterResult::finalized(
            MeasurementSample {
                round_trip_ms: 48.0,
                packet_loss_pct: 0.5,
                jitter_ms: 6.5,
            },
            4.32,
            9,
        );

        let line = formatter.format_jitter_result(&result).unwrap();
        assert!(line.contains("4.32"));
        assert!(line.contains("6.50 ms"));
    }
}
