//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "haggle")]
#[command(about = "Haggle - buyer/seller negotiation simulator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single scenario file
    Run {
        /// Path to the scenario JSON
        scenario: PathBuf,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Run several scenario files in parallel and score them together
    Batch {
        /// Paths to scenario JSON files
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Perturb a base scenario's seller terms and score the variants
    Sweep {
        /// Base scenario JSON
        scenario: PathBuf,

        /// Number of variants
        #[arg(short = 'n', long, default_value = "50")]
        count: usize,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Print a JSON report instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    /// Chat-completions URL for offer messages (API key from HAGGLE_LLM_API_KEY)
    #[arg(long)]
    pub llm_url: Option<String>,

    /// Model name sent to the message service
    #[arg(long, default_value = "gpt-4o-mini")]
    pub llm_model: String,

    /// Bound on each message service call, in milliseconds
    #[arg(long, default_value = "5000")]
    pub timeout_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from(["haggle", "run", "scenarios/baseline.json", "--json"]).unwrap();
        match cli.command {
            Commands::Run { scenario, output, llm } => {
                assert_eq!(scenario, PathBuf::from("scenarios/baseline.json"));
                assert!(output.json);
                assert!(llm.llm_url.is_none());
                assert_eq!(llm.timeout_ms, 5000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_sweep_defaults() {
        let cli = Cli::try_parse_from(["haggle", "sweep", "base.json"]).unwrap();
        match cli.command {
            Commands::Sweep { count, seed, output, .. } => {
                assert_eq!(count, 50);
                assert_eq!(seed, 42);
                assert!(!output.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_batch_requires_files() {
        assert!(Cli::try_parse_from(["haggle", "batch"]).is_err());
    }
}
