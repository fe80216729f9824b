use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "brt-tracking")]
#[command(about = "Query BRT's tracking web services")]
pub struct Cli {
    /// Path to TOML configuration file (defaults to brt.toml when present)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Download and patch every configured WSDL into the local cache
    CacheWsdl,

    /// Full tracking document for a BRT shipment id
    Track {
        shipment_id: String,

        /// Shipment year, current year when omitted
        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        lang: Option<String>,
    },

    /// Shipment id from the sender's numeric reference
    IdByRmn { reference: String },

    /// Shipment id from the sender's alphanumeric reference
    IdByRma { reference: String },

    /// Shipment id and year from a parcel id
    IdByParcel { parcel_id: String },

    /// Complete status legend
    StatusLegend {
        #[arg(long)]
        lang: Option<String>,
    },

    /// Complete event legend
    EventLegend {
        #[arg(long)]
        lang: Option<String>,
    },
}
