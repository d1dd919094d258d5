//! CLI entry point for sleuth.

pub mod research;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::SleuthConfig;

/// Sleuth research CLI
#[derive(Parser, Debug)]
#[command(name = "sleuth", version, about = "Tool-calling company research agent")]
pub struct Cli {
    /// Config file (defaults to $SLEUTH_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research one or more companies
    Research(ResearchArgs),
    /// Inspect or clear the response cache
    Cache(CacheArgs),
}

/// Arguments for the `research` subcommand.
#[derive(Parser, Debug)]
pub struct ResearchArgs {
    /// Company names or URLs; read from stdin (one per line) when omitted
    pub companies: Vec<String>,

    /// Guidance keywords, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Tool calls allowed before completion is forced
    #[arg(long)]
    pub max_steps: Option<usize>,

    /// Companies researched concurrently
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Also advertise the Crunchbase financials tool
    #[arg(long)]
    pub crunchbase: bool,

    /// Disable the response cache
    #[arg(long)]
    pub no_cache: bool,

    /// Response cache file
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Write the reports as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not print the conversation as it happens
    #[arg(short, long)]
    pub quiet: bool,
}

impl ResearchArgs {
    /// Apply flag overrides on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut SleuthConfig) {
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        if let Some(ref cache) = self.cache {
            config.cache.path = Some(cache.clone());
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
    }

    /// Keywords with surrounding whitespace and empty entries removed.
    pub fn clean_keywords(&self) -> Vec<String> {
        self.keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Arguments for the `cache` subcommand group.
#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

/// Cache subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show the cache location and entry count
    Stats,
    /// Remove every cached response
    Clear,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_research_with_defaults() {
        let cli = Cli::try_parse_from(["sleuth", "research", "acme.dev"]).unwrap();
        match cli.command {
            Commands::Research(args) => {
                assert_eq!(args.companies, vec!["acme.dev".to_string()]);
                assert!(args.keywords.is_empty());
                assert_eq!(args.jobs, 1);
                assert!(!args.no_cache);
                assert!(args.model.is_none());
            }
            other => panic!("expected Research, got {other:?}"),
        }
    }

    #[test]
    fn parse_research_with_all_options() {
        let cli = Cli::try_parse_from([
            "sleuth",
            "--config",
            "/etc/sleuth.toml",
            "research",
            "acme",
            "globex",
            "-k",
            "devtools, search",
            "-m",
            "gpt-4",
            "--max-steps",
            "5",
            "-j",
            "3",
            "--no-cache",
            "-o",
            "out.json",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/sleuth.toml")));
        match cli.command {
            Commands::Research(args) => {
                assert_eq!(args.companies.len(), 2);
                assert_eq!(args.clean_keywords(), vec!["devtools", "search"]);
                assert_eq!(args.jobs, 3);
                assert_eq!(args.output, Some(PathBuf::from("out.json")));

                let mut config = SleuthConfig::default();
                args.apply_to(&mut config);
                assert_eq!(config.model, "gpt-4");
                assert_eq!(config.max_steps, 5);
                assert!(!config.cache.enabled);
            }
            other => panic!("expected Research, got {other:?}"),
        }
    }

    #[test]
    fn parse_cache_subcommands() {
        let cli = Cli::try_parse_from(["sleuth", "cache", "clear"]).unwrap();
        match cli.command {
            Commands::Cache(cache) => assert!(matches!(cache.command, CacheCommands::Clear)),
            other => panic!("expected Cache, got {other:?}"),
        }
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["sleuth"]).is_err());
    }
}
