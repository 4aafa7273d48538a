use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fare-sniper")]
#[command(about = "Airfare steal sniper: baselines, deal scoring and one-way pairing")]
pub struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    pub config: String,
    /// Path to the SQLite database.
    #[arg(long, default_value = "fare_offers.db")]
    pub db: String,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch new offers and process them on a schedule (the default).
    Run {
        /// Run a single cycle and exit.
        #[arg(long)]
        once: bool,
        /// Departure date (YYYY-MM-DD) for manual tests.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Fetch offers only and print them.
    Fetch {
        /// Departure date (YYYY-MM-DD) for manual tests.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Recompute rolling and weekday aggregates.
    Aggregate,
    /// Aggregate history and send the daily digest.
    Report,
}
