//! CLI argument definitions using clap
//!
//! Commands:
//! - bitemporal init --config <path>
//! - bitemporal exec --config <path>
//! - bitemporal serve --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// bitemporal - Version and revision history for identified documents
#[derive(Parser, Debug)]
#[command(name = "bitemporal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new data directory with an empty snapshot log
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./bitemporal.json")]
        config: PathBuf,
    },

    /// Execute a single JSON request from stdin and exit
    Exec {
        /// Path to configuration file
        #[arg(long, default_value = "./bitemporal.json")]
        config: PathBuf,
    },

    /// Serve JSON requests from stdin, one per line
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./bitemporal.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exec_with_config() {
        let cli = Cli::try_parse_from(["bitemporal", "exec", "--config", "/etc/bt.json"]).unwrap();
        match cli.command {
            Command::Exec { config } => assert_eq!(config, PathBuf::from("/etc/bt.json")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["bitemporal", "init"]).unwrap();
        match cli.command {
            Command::Init { config } => assert_eq!(config, PathBuf::from("./bitemporal.json")),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
