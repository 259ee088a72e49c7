// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::telemetry::setup_simple_tracing;
use crate::{print_config, simulate};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use prio_config::{load_config, AppConfig};
use tracing::{info, instrument, Level};

#[derive(Parser, Debug)]
#[command(name = "prio")]
#[command(about = "Private aggregation with distributed validity checks", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `prio -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        setup_simple_tracing(self.log_level());
        let config = self.load_config()?;
        info!(
            field = %config.field,
            num_servers = config.num_servers,
            fields = config.fields.len(),
            "Config loaded"
        );

        match self.command {
            Commands::Simulate {
                requests,
                invalid,
            } => simulate::execute(config, requests, invalid).await?,
            Commands::PrintConfig => print_config::execute(&config)?,
        }

        Ok(())
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        load_config(self.config.clone())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a deployment in-process and push random submissions through it
    Simulate {
        /// Number of valid submissions
        #[arg(long, default_value_t = 10)]
        requests: usize,

        /// Number of corrupted submissions
        #[arg(long, default_value_t = 0)]
        invalid: usize,
    },

    /// Print the effective configuration as YAML
    PrintConfig,
}
