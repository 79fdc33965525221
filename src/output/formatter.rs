//! Core formatting traits and the plain text implementation

use crate::error::Result;
use crate::models::{JitterResult, ThroughputResult, VideoResult};
use crate::registry::RegistrySnapshot;
use std::fmt::Write as _;

/// Main trait for output formatting
pub trait OutputFormatter: Send + Sync {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// One-line progress summary of a jitter probe result
    fn format_jitter_result(&self, result: &JitterResult) -> Result<String>;

    /// One-line progress summary of a throughput probe result
    fn format_throughput_result(&self, result: &ThroughputResult) -> Result<String>;

    /// One-line progress summary of a video probe result
    fn format_video_result(&self, result: &VideoResult) -> Result<String>;

    /// Format the final summary table over every published result
    fn format_summary_table(&self, snapshot: &RegistrySnapshot) -> Result<String>;

    /// Format error messages
    fn format_error(&self, message: &str) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, message: &str) -> Result<String>;

    /// Format success messages
    fn format_success(&self, message: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Enable verbose mode with detailed information
    pub verbose_mode: bool,
    /// Show table borders
    pub table_borders: bool,
    /// Maximum output width
    pub max_width: usize,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
            max_width: 100,
        }
    }
}

/// One row of the summary table: section, metric, value
pub type SummaryRow = (String, String, String);

/// Flatten a registry snapshot into summary rows, in probe order.
/// Shared by the plain and colored formatters.
pub(super) fn summary_rows(snapshot: &RegistrySnapshot) -> Vec<SummaryRow> {
    let mut rows = Vec::new();

    if let Some(ref jitter) = snapshot.jitter {
        let section = "Jitter/MOS".to_string();
        rows.push((
            section.clone(),
            "MOS".to_string(),
            format!("{:.2} ({})", jitter.mos, jitter.quality()),
        ));
        rows.push((
            section.clone(),
            "Jitter".to_string(),
            format!("{:.2} ms", jitter.jitter_ms),
        ));
        rows.push((
            section.clone(),
            "Packet loss".to_string(),
            format!("{:.2}%", jitter.packet_loss_pct),
        ));
        rows.push((
            section,
            "RTT".to_string(),
            format!("{:.0} ms ({} samples)", jitter.rtt_ms, jitter.sample_count),
        ));
    }

    if let Some(ref throughput) = snapshot.throughput {
        let section = "Throughput".to_string();
        if throughput.success {
            rows.push((
                section.clone(),
                "Download".to_string(),
                format!("{:.2} Mbps", throughput.download_mbps),
            ));
            rows.push((
                section.clone(),
                "Upload".to_string(),
                format!("{:.2} Mbps", throughput.upload_mbps),
            ));
            rows.push((
                section.clone(),
                "Mean RTT".to_string(),
                format!("{:.0} ms", throughput.rtt_ms),
            ));
            rows.push((
                section,
                "Endpoint".to_string(),
                throughput.endpoint.clone().unwrap_or_else(|| "-".to_string()),
            ));
        } else {
            rows.push((
                section,
                "Status".to_string(),
                format!("failed after {} attempts", throughput.attempts),
            ));
        }
    }

    if let Some(ref video) = snapshot.video {
        let section = "Video".to_string();
        rows.push((
            section.clone(),
            "Initial latency".to_string(),
            format!("{:.0} ms", video.initial_latency_ms),
        ));
        rows.push((
            section.clone(),
            "Buffering".to_string(),
            format!("{:.1} s", video.total_buffering_ms / 1000.0),
        ));
        rows.push((
            section,
            "Rebuffer ratio".to_string(),
            format!("{:.2}%", video.rebuffer_ratio_pct),
        ));
    }

    rows
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    fn render_table(&self, rows: &[SummaryRow]) -> String {
        if rows.is_empty() {
            return "No results were published.\n".to_string();
        }

        let headers = ["Probe", "Metric", "Value"];
        let mut widths = [headers[0].len(), headers[1].len(), headers[2].len()];
        for (section, metric, value) in rows {
            widths[0] = widths[0].max(section.len());
            widths[1] = widths[1].max(metric.len());
            widths[2] = widths[2].max(value.len());
        }
        let cap = self.options.max_width / 3;
        for width in &mut widths {
            *width = (*width).min(cap.max(8));
        }

        let border = format!(
            "+-{}-+-{}-+-{}-+",
            "-".repeat(widths[0]),
            "-".repeat(widths[1]),
            "-".repeat(widths[2])
        );
        let row_line = |a: &str, b: &str, c: &str| {
            format!(
                "| {:<w0$} | {:<w1$} | {:<w2$} |",
                truncate(a, widths[0]),
                truncate(b, widths[1]),
                truncate(c, widths[2]),
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2]
            )
        };

        let mut output = String::new();
        if self.options.table_borders {
            let _ = writeln!(output, "{}", border);
        }
        let _ = writeln!(output, "{}", row_line(headers[0], headers[1], headers[2]));
        if self.options.table_borders {
            let _ = writeln!(output, "{}", border);
        }

        let mut previous_section: Option<&str> = None;
        for (section, metric, value) in rows {
            // Repeat the section label only on its first row
            let label = if previous_section == Some(section.as_str()) {
                ""
            } else {
                section.as_str()
            };
            let _ = writeln!(output, "{}", row_line(label, metric, value));
            previous_section = Some(section.as_str());
        }
        if self.options.table_borders {
            let _ = writeln!(output, "{}", border);
        }
        output
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    // Cut on a char boundary; endpoint URLs may contain multibyte characters
    let keep = if max > 3 { max - 3 } else { max };
    let mut cut = keep;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    if max > 3 {
        format!("{}...", &text[..cut])
    } else {
        text[..cut].to_string()
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, title: &str) -> Result<String> {
        let underline = "=".repeat(title.len());
        Ok(format!("{}\n{}", title, underline))
    }

    fn format_jitter_result(&self, result: &JitterResult) -> Result<String> {
        Ok(format!(
            "Jitter/MOS: {:.2} ({}) | jitter {:.2} ms | loss {:.2}% | RTT {:.0} ms",
            result.mos,
            result.quality(),
            result.jitter_ms,
            result.packet_loss_pct,
            result.rtt_ms
        ))
    }

    fn format_throughput_result(&self, result: &ThroughputResult) -> Result<String> {
        if result.success {
            Ok(format!(
                "Throughput: {:.2} Mbps down | {:.2} Mbps up | RTT {:.0} ms | via {}",
                result.download_mbps,
                result.upload_mbps,
                result.rtt_ms,
                result.endpoint.as_deref().unwrap_or("-")
            ))
        } else {
            Ok(format!(
                "Throughput: all {} endpoints failed",
                result.attempts
            ))
        }
    }

    fn format_video_result(&self, result: &VideoResult) -> Result<String> {
        Ok(format!(
            "Video: initial latency {:.0} ms | buffering {:.1} s | rebuffer ratio {:.2}%",
            result.initial_latency_ms,
            result.total_buffering_ms / 1000.0,
            result.rebuffer_ratio_pct
        ))
    }

    fn format_summary_table(&self, snapshot: &RegistrySnapshot) -> Result<String> {
        Ok(self.render_table(&summary_rows(snapshot)))
    }

    fn format_error(&self, message: &str) -> Result<String> {
        Ok(format!("ERROR: {}", message))
    }

    fn format_warning(&self, message: &str) -> Result<String> {
        Ok(format!("WARNING: {}", message))
    }

    fn format_success(&self, message: &str) -> Result<String> {
        Ok(format!("OK: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeasurementSample;

    fn snapshot_with_jitter() -> RegistrySnapshot {
        let mut snapshot = RegistrySnapshot::default();
        snapshot.jitter = Some(JitterResult::finalized(
            MeasurementSample {
                round_trip_ms: 48.0,
                packet_loss_pct: 0.5,
                jitter_ms: 6.5,
            },
            4.32,
            9,
        ));
        snapshot
    }

    #[test]
    fn test_summary_rows_in_probe_order() {
        let mut snapshot = snapshot_with_jitter();
        snapshot.video = Some(VideoResult::finalized(850.0, 6_000.0, 120.0));

        let rows = summary_rows(&snapshot);
        assert_eq!(rows[0].0, "Jitter/MOS");
        assert!(rows.iter().any(|(s, m, _)| s == "Video" && m == "Rebuffer ratio"));
        // No throughput entry published, no throughput rows
        assert!(!rows.iter().any(|(s, _, _)| s == "Throughput"));
    }

    #[test]
    fn test_failed_throughput_renders_status_row() {
        let mut snapshot = RegistrySnapshot::default();
        snapshot.throughput = Some(ThroughputResult::exhausted(3));

        let rows = summary_rows(&snapshot);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, "Status");
        assert!(rows[0].2.contains("3 attempts"));
    }

    #[test]
    fn test_plain_table_contains_all_metrics() {
        let formatter = PlainFormatter::new(FormattingOptions {
            enable_color: false,
            ..Default::default()
        });
        let table = formatter.format_summary_table(&snapshot_with_jitter()).unwrap();

        assert!(table.contains("MOS"));
        assert!(table.contains("4.32"));
        assert!(table.contains("excellent"));
        assert!(table.contains("+-"));
    }

    #[test]
    fn test_empty_snapshot_renders_placeholder() {
        let formatter = PlainFormatter::new(FormattingOptions::default());
        let table = formatter
            .format_summary_table(&RegistrySnapshot::default())
            .unwrap();
        assert!(table.contains("No results"));
    }

    #[test]
    fn test_truncate_long_cells() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-endpoint-url", 10), "a-very-...");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // 30 bytes into this string lands mid-character; the cut must back
        // off to the previous boundary instead of panicking
        let url = "https://example.com/ファイルファイルファイルファイル";
        for max in 4..url.len() {
            let cell = truncate(url, max);
            assert!(cell.len() <= max, "len {} > max {}", cell.len(), max);
        }
        assert_eq!(truncate("ファイル", 2), "");
    }

    #[test]
    fn test_table_renders_multibyte_endpoint() {
        let formatter = PlainFormatter::new(FormattingOptions {
            enable_color: false,
            ..Default::default()
        });
        // The value column caps at 33 bytes here, so the cut for this URL
        // falls inside a multibyte character
        let mut snapshot = RegistrySnapshot::default();
        snapshot.throughput = Some(ThroughputResult::finalized(
            92.4,
            18.1,
            31.0,
            "https://example.com/ファイルファイルファイルファイル".to_string(),
            1,
        ));

        let table = formatter.format_summary_table(&snapshot).unwrap();
        assert!(table.contains("Download"));
    }
}
