pub mod catalog;
pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod io_utils;
pub mod missing;
pub mod profile;
pub mod qc;
pub mod render;
pub mod table;
pub mod table_profile;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(verbose: bool) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if verbose {
            builder.filter_module("qc_report", LevelFilter::Debug);
        } else if env::var("RUST_LOG").is_err() {
            builder.filter_module("qc_report", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    debug!("{:?}", cli.command);
    match cli.command {
        Commands::Profile(args) => {
            if qc::execute_profile(&args)?.is_none() {
                info!("No report written");
            }
            Ok(())
        }
        Commands::Summary(args) => qc::execute_summary(&args),
        Commands::InitConfig(args) => qc::execute_init_config(&args),
    }
}
