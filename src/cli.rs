//! Command-line interface parsing for Tiki Product Reviewer
//!
//! This module handles parsing of CLI arguments using clap: the global
//! `--model`, `--timeout-ms` and `--no-cache` flags and one subcommand per
//! backend operation.

use clap::{Parser, Subcommand};
use std::time::Duration;
use thiserror::Error;

use crate::models::Model;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified model name is not recognized
    #[error("Invalid model: '{0}'. Valid models: gpt-4o-mini, gemini-2.5-flash, deep-seek-r1")]
    InvalidModel(String),

    /// A `--param` value is not of the form `key=value`
    #[error("Invalid parameter: '{0}'. Expected key=value")]
    InvalidParam(String),
}

/// Tiki Product Reviewer - Ask about tech products based on real customer reviews
#[derive(Parser, Debug)]
#[command(name = "tiki-reviewer")]
#[command(about = "Product insights from real customer reviews on Tiki")]
#[command(version)]
pub struct Cli {
    /// Language model used for chat answers
    ///
    /// Valid models: gpt-4o-mini, gemini-2.5-flash, deep-seek-r1
    #[arg(long, short, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Don't reuse cached or in-flight chat answers
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask for a review analysis of a product
    Ask {
        /// Product name, e.g. "iPhone 15 Pro Max"
        product: String,
        /// Print the raw backend response instead of the cleaned answer
        #[arg(long)]
        raw: bool,
    },
    /// Send a free-form query to the backend
    Query { query: String },
    /// Translate a natural-language question to SQL and run it
    Text2sql { query: String },
    /// List product reviews
    Reviews {
        /// Filter as key=value, may be repeated
        #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// Scrape a product from Tiki by name
    Scrape { product_name: String },
    /// List electronics categories
    Categories,
    /// Show the database structure
    DbStructure,
    /// Fetch health data for a user
    HealthData { user_id: String },
    /// Check that the backend is up
    Health,
    /// List the available models
    Models,
}

/// Settings derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub model: Model,
    pub timeout: Option<Duration>,
    pub use_cache: bool,
    /// Parsed `--param` filters of the `reviews` command
    pub review_params: Vec<(String, String)>,
    pub command: Command,
}

/// Parses a model string argument into a Model enum.
///
/// # Arguments
/// * `s` - The model string from CLI
///
/// # Returns
/// * `Ok(Model)` if the string matches a valid model
/// * `Err(CliError::InvalidModel)` if the string doesn't match
pub fn parse_model_arg(s: &str) -> Result<Model, CliError> {
    Model::from_str(s).ok_or_else(|| CliError::InvalidModel(s.to_string()))
}

/// Splits a `key=value` argument at the first `=`.
pub fn parse_param_arg(s: &str) -> Result<(String, String), CliError> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(CliError::InvalidParam(s.to_string())),
    }
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Settings)` with appropriate settings
    /// * `Err(CliError)` if an invalid model or parameter was specified
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let model = match &cli.model {
            None => Model::default(),
            Some(name) => parse_model_arg(name)?,
        };

        let review_params = match &cli.command {
            Command::Reviews { params } => params
                .iter()
                .map(|p| parse_param_arg(p))
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        Ok(Settings {
            model,
            timeout: cli.timeout_ms.map(Duration::from_millis),
            use_cache: !cli.no_cache,
            review_params,
            command: cli.command.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_arg_ids() {
        assert_eq!(parse_model_arg("gpt-4o-mini").unwrap(), Model::Gpt4oMini);
        assert_eq!(parse_model_arg("gemini-2.5-flash").unwrap(), Model::Gemini25Flash);
        assert_eq!(parse_model_arg("deep-seek-r1").unwrap(), Model::DeepSeekR1);
    }

    #[test]
    fn test_parse_model_arg_invalid() {
        let result = parse_model_arg("invalid");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid model"));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_parse_param_arg() {
        assert_eq!(
            parse_param_arg("product=iphone 15").unwrap(),
            ("product".to_string(), "iphone 15".to_string())
        );
        assert_eq!(
            parse_param_arg("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_param_arg("novalue").is_err());
        assert!(parse_param_arg("=x").is_err());
    }

    #[test]
    fn test_cli_parse_ask() {
        let cli = Cli::parse_from(["tiki-reviewer", "ask", "iphone 15"]);
        assert_eq!(
            cli.command,
            Command::Ask {
                product: "iphone 15".to_string(),
                raw: false
            }
        );
        assert!(cli.model.is_none());
        assert!(!cli.no_cache);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "tiki-reviewer",
            "ask",
            "kindle",
            "--model",
            "gemini",
            "--timeout-ms",
            "5000",
            "--no-cache",
        ]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.model, Model::Gemini25Flash);
        assert_eq!(settings.timeout, Some(Duration::from_millis(5000)));
        assert!(!settings.use_cache);
    }

    #[test]
    fn test_settings_defaults() {
        let cli = Cli::parse_from(["tiki-reviewer", "health"]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(settings.model, Model::Gpt4oMini);
        assert!(settings.timeout.is_none());
        assert!(settings.use_cache);
        assert_eq!(settings.command, Command::Health);
    }

    #[test]
    fn test_settings_invalid_model() {
        let cli = Cli::parse_from(["tiki-reviewer", "--model", "claude", "health"]);
        assert!(Settings::from_cli(&cli).is_err());
    }

    #[test]
    fn test_cli_parse_review_params() {
        let cli = Cli::parse_from(["tiki-reviewer", "reviews", "-p", "product=tv", "-p", "limit=5"]);
        assert_eq!(
            cli.command,
            Command::Reviews {
                params: vec!["product=tv".to_string(), "limit=5".to_string()]
            }
        );
        let settings = Settings::from_cli(&cli).unwrap();
        assert_eq!(
            settings.review_params,
            vec![
                ("product".to_string(), "tv".to_string()),
                ("limit".to_string(), "5".to_string())
            ]
        );
    }

    #[test]
    fn test_settings_rejects_bad_review_param() {
        let cli = Cli::parse_from(["tiki-reviewer", "reviews", "--param", "oops"]);
        let err = Settings::from_cli(&cli).unwrap_err();
        assert!(err.to_string().contains("oops"));
    }
}
