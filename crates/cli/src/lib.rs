use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use observability::LogFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "optx")]
#[command(about = "Options analytics - market-structure metrics from daily option chains")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Log output format (pretty, json, compact)
    #[arg(long, global = true, default_value = "pretty", env = "OPTX_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on this port
    #[arg(long, global = true)]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the metrics record for each symbol on one date
    Compute {
        /// Snapshot root directory (<root>/<SYMBOL>/<YYYYMMDD>/*.csv)
        #[arg(short, long)]
        input: PathBuf,

        /// Comma-separated underlying symbols
        #[arg(short, long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,

        /// Observation date, YYYYMMDD or YYYY-MM-DD
        #[arg(short, long, value_parser = parse_date_arg)]
        date: NaiveDate,

        /// Path to the configuration file, defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Include the per-strike GEX table in the output
        #[arg(long)]
        gex: bool,

        /// Write JSON lines here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate configuration without computing anything
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "optx.yaml")]
        config: PathBuf,
    },

    /// Write a configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "optx.yaml")]
        output: PathBuf,
    },
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    common::parse_date(s).map_err(|e| e.to_string())
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_compute_args() {
        let cli = Cli::try_parse_from([
            "optx", "compute", "--input", "data", "--symbols", "SPY,QQQ", "--date", "20250127",
            "--gex",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert_matches!(
            cli.command,
            Commands::Compute { symbols, date, gex: true, config: None, output: None, .. }
                if symbols == ["SPY", "QQQ"] && date == NaiveDate::from_ymd_opt(2025, 1, 27).unwrap()
        );
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "optx", "validate", "--config", "a.yaml", "--log-format", "JSON", "--metrics-port", "9100",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.metrics_port, Some(9100));
        assert_matches!(cli.command, Commands::Validate { .. });
    }

    #[test]
    fn test_bad_date_rejected() {
        let result = Cli::try_parse_from([
            "optx", "compute", "--input", "data", "--symbols", "SPY", "--date", "2025-13-40",
        ]);
        assert!(result.is_err());
    }
}
