//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use loanflow_domain::OutputFormat;
use std::path::PathBuf;

/// Report format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Colored human-readable report
    Text,
    /// JSON document on stdout
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// CLI arguments for loanflow
#[derive(Parser, Debug)]
#[command(name = "loanflow")]
#[command(
    author,
    version,
    about = "Batch orchestration and consistency scoring for loan document pipelines"
)]
#[command(long_about = r#"
loanflow drives every loan in a document store through a pipeline of
external stages, a bounded number of loans at a time, and reports which
loans succeeded, had no applicable data, timed out or failed.

The extraction stage is sampled several times per loan and the runs are
scored by how many of them agree.

Configuration files are loaded from (in priority order):
1. LOANFLOW_* environment variables
2. --config <path>     Explicit config file
3. ./loanflow.toml     Project-level config
4. ~/.config/loanflow/config.toml   Global config

Example:
  loanflow run --concurrency 8 --runs 3
  loanflow retry 1001 1007 --pipeline retry
  loanflow sample 1001 --runs 5
  loanflow compare
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Report format (defaults to `[output] format`)
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<FormatArg>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long, global = true)]
    pub show_config: bool,

    /// Also write diagnostic logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Document store root (overrides `[store] root`)
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run loans through a pipeline
    Run {
        /// Loans to run; every ready loan in the store when omitted
        loan_ids: Vec<String>,

        /// Pipeline to run (defaults to `[batch] pipeline`)
        #[arg(short, long)]
        pipeline: Option<String>,

        /// Maximum loans in flight
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Sampling runs passed to stages as `{param}`
        #[arg(short, long)]
        runs: Option<u32>,

        /// Skip stages whose completion artifact already exists
        #[arg(long)]
        resume: bool,
    },

    /// Re-run named loans through a sub-pipeline
    Retry {
        /// Loans to retry
        #[arg(required = true)]
        loan_ids: Vec<String>,

        /// Pipeline to run (defaults to `[batch] retry_pipeline`)
        #[arg(short, long)]
        pipeline: Option<String>,

        /// Only these stages of the pipeline
        #[arg(long, value_delimiter = ',')]
        stages: Vec<String>,

        /// Maximum loans in flight
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Sampling runs passed to stages as `{param}`
        #[arg(short, long)]
        runs: Option<u32>,
    },

    /// Sample the extractor for one loan and score agreement
    Sample {
        loan_id: String,

        /// Number of runs (defaults to `[extractor] sample_size`)
        #[arg(short, long)]
        runs: Option<usize>,
    },

    /// Recompute a loan's consistency summary from stored runs
    Summarize { loan_id: String },

    /// Compare extracted income against the final application form
    Compare {
        /// Directory for the CSV report (defaults to `[store] aggregate_dir`)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },

    /// Audit borrower consistency and income movement across form versions
    Audit {
        /// Number of largest income changes to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// List loans ready for a pipeline
    Discover {
        /// Pipeline whose readiness requirement applies
        #[arg(short, long)]
        pipeline: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_arguments() {
        let cli = Cli::parse_from([
            "loanflow", "run", "1001", "1002", "-c", "8", "--runs", "5", "--resume",
        ]);
        match cli.command {
            Command::Run {
                loan_ids,
                concurrency,
                runs,
                resume,
                pipeline,
            } => {
                assert_eq!(loan_ids, vec!["1001", "1002"]);
                assert_eq!(concurrency, Some(8));
                assert_eq!(runs, Some(5));
                assert!(resume);
                assert!(pipeline.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["loanflow", "compare", "-o", "json", "-vv", "--quiet"]);
        assert_eq!(cli.output, Some(FormatArg::Json));
        assert_eq!(OutputFormat::from(FormatArg::Json), OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
    }

    #[test]
    fn test_retry_requires_ids_and_splits_stages() {
        assert!(Cli::try_parse_from(["loanflow", "retry"]).is_err());

        let cli = Cli::parse_from(["loanflow", "retry", "A", "C", "--stages", "scenario,analysis"]);
        match cli.command {
            Command::Retry {
                loan_ids, stages, ..
            } => {
                assert_eq!(loan_ids, vec!["A", "C"]);
                assert_eq!(stages, vec!["scenario", "analysis"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
