use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "lakesweep")]
#[command(about = "Predictive FIFO storage management for asset recording trees", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline once: scan, forecast, evaluate, cleanup
    Run,
    /// Scan the recording tree and record today's snapshot
    Scan,
    /// Scan, then compute and store a next-day forecast
    Forecast,
    /// Show scheduler state, cached metrics and last/next run
    Status {
        /// Emit machine-readable JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Show 14-day average weights per entity
    Weights,
    /// Show recent deletion audit entries
    Deletions {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Run the scheduler in the foreground until Enter is pressed
    Watch,
    /// Generate a synthetic recording tree with backdated history
    Generate {
        #[arg(long, default_value_t = 1.0)]
        size_gb: f64,
    },
    /// Print configuration values
    PrintConfig,
}
