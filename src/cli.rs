use clap::{Args, Parser, Subcommand, ValueEnum};
use dwa::{ConfigError, DecayingWindowAverage};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Average the given samples once
    Mean {
        #[command(flatten)]
        window: WindowArgs,
        /// Samples to record, oldest first
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<i64>,
    },
    /// Read samples from stdin and report the decaying average
    Watch(Watch),
}

#[derive(Args, Clone, Debug)]
pub struct WindowArgs {
    /// Number of samples kept in the window
    #[arg(long, default_value_t = 100)]
    pub capacity: usize,

    /// Milliseconds without new samples before the oldest one is zeroed (0 disables decay)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub decay_ms: i64,
}

impl WindowArgs {
    pub fn build(&self) -> Result<DecayingWindowAverage, ConfigError> {
        DecayingWindowAverage::try_from_millis(self.capacity, self.decay_ms)
    }
}

#[derive(Parser, Clone, Debug)]
pub struct Watch {
    #[command(flatten)]
    pub window: WindowArgs,

    /// Report interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}
