use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::network::{Selection, DEFAULT_MAX_NODE_COUNT};

/// Log levels as defined in log2 crate
#[derive(Debug, Serialize, Deserialize, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Program arguments. `BuildConfig` and `EstimatorConfig` describe only
/// a single build or cutoff search.
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// JSON file with the product system and its calculated result
    #[arg(short, long)]
    pub input: PathBuf,
    /// Flow or impact category to show, e.g. `impact:3` or `flow:12`
    #[arg(short, long)]
    pub selection: Option<String>,
    /// Minimum share of a link to be followed (0 shows everything)
    #[arg(short, long, default_value = "0.01")]
    pub cutoff: f64,
    /// Estimate a cutoff giving about this many nodes instead of using --cutoff
    #[arg(long)]
    pub target_nodes: Option<usize>,
    /// Maximum number of nodes in the network
    #[arg(long, default_value_t = DEFAULT_MAX_NODE_COUNT)]
    pub max_nodes: usize,
    /// Output file for the network: `.dot` writes Graphviz, anything else JSON
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", value_enum)]
    pub log_level: LogLevel,
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.cutoff) {
            anyhow::bail!("cutoff must be between 0 and 1");
        }
        if self.max_nodes == 0 {
            anyhow::bail!("max_nodes must be greater than 0");
        }
        if self.target_nodes == Some(0) {
            anyhow::bail!("target_nodes must be greater than 0");
        }
        if let Some(selection) = &self.selection {
            selection.parse::<Selection>()?;
        }
        Ok(())
    }

    pub fn selection(&self) -> anyhow::Result<Option<Selection>> {
        self.selection.as_deref().map(str::parse).transpose()
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}
