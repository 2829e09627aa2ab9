//! Configuration and CLI argument handling

use std::time::Duration;
use clap::Parser;

use crate::{
    error::TimerError,
    timer::{TimeUnit, TimerConfig},
};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "app-timer")]
#[command(about = "Launch an application and close it when its time runs out")]
#[command(version)]
pub struct Config {
    /// Port to bind the control API to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Seconds remaining when the "time running out" notice fires (0 disables it)
    #[arg(long, default_value = "60")]
    pub warning_threshold: u64,

    /// Command used to show desktop notifications
    #[arg(long, default_value = "notify-send")]
    pub notify_command: String,

    /// Application to launch and time right away
    #[arg(long, requires = "duration")]
    pub launch: Option<String>,

    /// Duration for --launch, in --unit
    #[arg(short, long, requires = "launch")]
    pub duration: Option<u64>,

    /// Unit of --duration
    #[arg(short, long, value_enum, default_value_t = TimeUnit::Seconds)]
    pub unit: TimeUnit,

    /// Show desktop notifications for the --launch run
    #[arg(long)]
    pub notify: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Controller timing derived from the CLI
    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig {
            tick_interval: Duration::from_secs(1),
            warning_threshold: (self.warning_threshold > 0).then_some(self.warning_threshold),
        }
    }

    /// The run requested with `--launch`, as app name and seconds
    pub fn initial_run(&self) -> Result<Option<(String, u64)>, TimerError> {
        match (&self.launch, self.duration) {
            (Some(app), Some(amount)) => Ok(Some((app.clone(), self.unit.to_seconds(amount)?))),
            _ => Ok(None),
        }
    }
}
