use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Profile tabular datasets against table/column/code catalogs",
    long_about = None
)]
pub struct Cli {
    /// Enable debug logging for qc-report
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Profile every dataset and write the QC workbook
    Profile(ProfileArgs),
    /// Profile every dataset and print each result matrix to stdout
    Summary(RunArgs),
    /// Write the default config.json if it does not exist yet
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directory holding the datasets (.csv, .tsv, .xlsx, ...)
    #[arg(short = 'd', long = "data", default_value = "data")]
    pub data_dir: PathBuf,
    /// Directory holding the table/column/code catalog documents
    #[arg(long = "docs", default_value = "documents")]
    pub docs_dir: PathBuf,
    /// Configuration file (created with defaults when absent)
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,
    /// Date/time columns for a table as `TABLE=col1,col2` (repeatable)
    #[arg(long = "datetime", action = clap::ArgAction::Append)]
    pub datetime: Vec<String>,
    /// Additional token to treat as missing (repeatable)
    #[arg(long = "na", action = clap::ArgAction::Append)]
    pub na: Vec<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited inputs and documents (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Infer date/time storage for text columns of delimited files
    #[arg(long = "infer-dates")]
    pub infer_dates: bool,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub run: RunArgs,
    /// Directory the workbook is written to
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Configuration file to create
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
