//! Main application orchestration and execution

use crate::cli::Cli;
use crate::config::{display_config_summary, load_config};
use crate::error::{AppError, Result};
use crate::logging::{Logger, LogLevel};
use crate::models::Config;
use crate::output::{ConsoleSummarySink, OutputFormatter, OutputFormatterFactory};
use crate::probe::{
    JitterProbe, JitterProbeConfig, SimulatedPlayback, ThroughputProbe, ThroughputProbeConfig,
    UdpLoopbackTransport, VideoProbe,
};
use crate::registry::ResultsRegistry;
use crate::types::ProbeKind;
use std::sync::Arc;

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
    logger: Logger,
}

impl App {
    /// Create a new application instance from parsed CLI arguments
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let (config, warnings) = load_config(cli)?;

        let level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };
        let logger = Logger::new("nqp", level, config.enable_color);

        for warning in &warnings {
            logger.warn(&warning.message);
        }

        Ok(Self { config, logger })
    }

    /// Create an application over an already-validated configuration
    pub fn new(config: Config, logger: Logger) -> Self {
        Self { config, logger }
    }

    /// Run every selected probe in order and render the final summary.
    ///
    /// Probes are independent: one probe failing does not stop the others.
    /// The run as a whole fails only when no selected probe produced a
    /// result.
    pub async fn run(self) -> Result<()> {
        if self.config.debug {
            println!("{} v{}", crate::PKG_NAME, crate::VERSION);
            println!(
                "Built {} for {} (commit {})",
                env!("BUILD_TIME"),
                env!("TARGET_TRIPLE"),
                option_env!("GIT_COMMIT").unwrap_or("unknown")
            );
            println!("\nConfiguration Summary:");
            println!("{}\n", display_config_summary(&self.config));
        }

        let formatter =
            OutputFormatterFactory::create_formatter(self.config.enable_color, self.config.verbose);
        println!(
            "{}\n",
            formatter.format_header(&format!("Network Quality Probe v{}", crate::VERSION))?
        );

        let registry = Arc::new(ResultsRegistry::new());
        registry.add_sink(Arc::new(ConsoleSummarySink::new(
            OutputFormatterFactory::create_formatter(
                self.config.enable_color,
                self.config.verbose,
            ),
        )));

        let mut failures: Vec<(ProbeKind, AppError)> = Vec::new();
        let mut completed = 0usize;

        for &kind in &self.config.probes {
            match self.run_probe(kind, &registry, formatter.as_ref()).await {
                Ok(ran) => {
                    if ran {
                        completed += 1;
                    }
                }
                Err(e) => {
                    eprintln!("{}", formatter.format_error(&e.format_for_console(false))?);
                    failures.push((kind, e));
                }
            }
        }

        println!("\n{}", formatter.format_header("Summary")?);
        println!("{}", formatter.format_summary_table(&registry.snapshot())?);

        if !failures.is_empty() {
            let names: Vec<&str> = failures.iter().map(|(kind, _)| kind.name()).collect();
            println!(
                "{}",
                formatter.format_warning(&format!("probes failed: {}", names.join(", ")))?
            );
        }

        if completed == 0 {
            let (_, error) = failures
                .into_iter()
                .next()
                .unwrap_or((ProbeKind::Jitter, AppError::probe("no probe was run")));
            return Err(error);
        }
        Ok(())
    }

    /// Run one probe; returns whether it actually ran (the video probe is
    /// skipped without a media URL)
    async fn run_probe(
        &self,
        kind: ProbeKind,
        registry: &Arc<ResultsRegistry>,
        formatter: &dyn OutputFormatter,
    ) -> Result<bool> {
        match kind {
            ProbeKind::Jitter => {
                self.logger.info("running jitter/MOS probe");
                let transport = UdpLoopbackTransport::new();
                let mut probe = JitterProbe::new(
                    transport,
                    JitterProbeConfig::from(&self.config),
                    registry.clone(),
                    self.logger.clone(),
                );
                probe.run().await?;
                Ok(true)
            }
            ProbeKind::Throughput => {
                self.logger.info("running throughput probe");
                let mut probe = ThroughputProbe::new(
                    ThroughputProbeConfig::from(&self.config),
                    registry.clone(),
                    self.logger.clone(),
                )?;
                probe.run().await?;
                Ok(true)
            }
            ProbeKind::Video => {
                let video_url = match self.config.video_url {
                    Some(ref url) => url.clone(),
                    None => {
                        println!(
                            "{}",
                            formatter
                                .format_warning("video probe skipped: no media URL configured")?
                        );
                        return Ok(false);
                    }
                };
                self.logger.info("running video rebuffering probe");
                let source = SimulatedPlayback::new(
                    video_url,
                    self.config.video_duration_secs,
                    self.config.timeout(),
                )?;
                let mut probe = VideoProbe::new(source, registry.clone(), self.logger.clone());
                probe.run().await?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_app_from_cli_builds_logger_level() {
        let cli = Cli::try_parse_from(["nqp", "--debug"]).unwrap();
        let app = App::from_cli(cli).unwrap();
        assert!(app.config.debug);
    }

    #[test]
    fn test_app_rejects_invalid_config() {
        let cli = Cli::try_parse_from(["nqp", "--timeout", "0"]).unwrap();
        assert!(App::from_cli(cli).is_err());
    }
}
