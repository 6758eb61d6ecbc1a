//! Command-line interface definitions.
//!
//! Settings given here override the YAML configuration file.

use std::path::PathBuf;

use clap::Parser;

/// Summarize every posted article of an advent calendar into a CSV file.
///
/// # Examples
///
/// ```sh
/// advent_summary https://adventar.org/calendars/10000 out/summary.csv --api-key KEY
///
/// # Qiita calendar for another year, with a config file
/// advent_summary https://qiita.com/advent-calendar/2025/rust out.csv -c config.yaml --year 2025
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Calendar page URL (adventar.org or qiita.com)
    pub calendar_url: String,

    /// Path of the CSV file to write
    pub output_path: PathBuf,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// API key for the completion endpoint
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model identifier sent to the completion endpoint
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible completion API
    #[arg(long)]
    pub api_base: Option<String>,

    /// Calendar year (defaults to the config file, then 2024)
    #[arg(long)]
    pub year: Option<i32>,

    /// Calendar month (defaults to the config file, then 12)
    #[arg(long)]
    pub month: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "advent_summary",
            "https://qiita.com/advent-calendar/2024/rust",
            "./out/summary.csv",
        ]);

        assert_eq!(cli.calendar_url, "https://qiita.com/advent-calendar/2024/rust");
        assert_eq!(cli.output_path, PathBuf::from("./out/summary.csv"));
        assert!(cli.config.is_none());
        assert!(cli.year.is_none());
    }

    #[test]
    fn test_cli_short_config_flag() {
        let cli = Cli::parse_from([
            "advent_summary",
            "https://adventar.org/calendars/1",
            "out.csv",
            "-c",
            "/tmp/config.yaml",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.yaml")));
    }

    #[test]
    fn test_cli_requires_output_path() {
        assert!(Cli::try_parse_from(["advent_summary", "https://adventar.org/calendars/1"]).is_err());
    }
}
