//! CLI command definitions.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the gateway
    Serve {
        /// Listen address, overrides the configured one
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Inspect or clear the on-disk offline cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show how the gateway treats a path
    Check {
        /// Request path, e.g. /dashboard/citizen
        path: String,

        /// Session cookie value to assume
        #[arg(short, long)]
        token: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List cache partitions
    List {
        /// Only this partition
        #[arg(short, long)]
        partition: Option<String>,
    },

    /// Delete cache partitions
    Clear {
        /// Only this partition
        #[arg(short, long)]
        partition: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
}
