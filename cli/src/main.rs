//! CLI entrypoint for loanflow
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use loanflow_application::{
    AuditTimelinesUseCase, BatchEventLogger, BatchProgressNotifier, CompareIncomeUseCase,
    LoanStorePort, NoEventLogger, NoProgress, RetryFailedInput, RetryFailedUseCase,
    RunBatchInput, RunBatchUseCase, RunPipelineUseCase, SampleConsistencyUseCase,
    SummarizeUseCase,
};
use loanflow_domain::{LoanId, OutputFormat};
use loanflow_infrastructure::{
    CommandExtractor, ConfigLoader, FileConfig, FsLoanStore, JsonlBatchLogger, StageRegistry,
    write_comparison_csv,
};
use loanflow_presentation::{Cli, Command, ConsoleFormatter, ProgressReporter, SimpleProgress};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Everything a subcommand needs, built once at startup.
struct App {
    config: FileConfig,
    store: Arc<dyn LoanStorePort>,
    registry: StageRegistry,
    progress: Arc<dyn BatchProgressNotifier>,
    logger: Arc<dyn BatchEventLogger>,
    format: OutputFormat,
    token: CancellationToken,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    // === Configuration ===
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };
    if let Some(root) = &cli.root {
        config.store.root = root.clone();
    }
    if let Some(log_file) = &cli.log_file {
        config.logging.log_file = Some(log_file.clone());
    }

    let _log_guard = init_logging(cli.verbose, config.logging.log_file.as_deref())?;
    info!("Starting loanflow");

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config error: {}", issue);
        }
        bail!("Invalid configuration ({} problems)", issues.len());
    }

    let format: OutputFormat = cli.output.map(Into::into).unwrap_or(config.output.format);
    ConsoleFormatter::configure_color(config.output.use_color(std::io::stdout().is_terminal()));

    // === Dependency Injection ===
    let store: Arc<dyn LoanStorePort> = Arc::new(FsLoanStore::new(&config.store.root));

    let progress: Arc<dyn BatchProgressNotifier> = if !config.output.show_progress(format, cli.quiet) {
        Arc::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(SimpleProgress)
    };

    let logger: Arc<dyn BatchEventLogger> = match &config.logging.events_file {
        Some(path) => match JsonlBatchLogger::new(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoEventLogger),
        },
        None => Arc::new(NoEventLogger),
    };

    let registry = StageRegistry::from_config(&config, Arc::clone(&store), Arc::clone(&progress))?;

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling loans still in flight");
            signal_token.cancel();
        }
    });

    let app = App {
        config,
        store,
        registry,
        progress,
        logger,
        format,
        token,
    };

    let output = match cli.command {
        Command::Run {
            loan_ids,
            pipeline,
            concurrency,
            runs,
            resume,
        } => app.run(loan_ids, pipeline, concurrency, runs, resume).await?,
        Command::Retry {
            loan_ids,
            pipeline,
            stages,
            concurrency,
            runs,
        } => app.retry(loan_ids, pipeline, stages, concurrency, runs).await?,
        Command::Sample { loan_id, runs } => app.sample(loan_id, runs).await?,
        Command::Summarize { loan_id } => app.summarize(loan_id).await?,
        Command::Compare { out_dir } => app.compare(out_dir.as_deref())?,
        Command::Audit { top } => app.audit(top)?,
        Command::Discover { pipeline } => app.discover(pipeline)?,
    };

    println!("{}", output);
    Ok(())
}

/// stderr at the `-v` level, plus an optional non-blocking file sink.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            if let Some(dir) = dir {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
            }
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;
            let appender =
                tracing_appender::rolling::never(dir.unwrap_or(Path::new(".")), file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

impl App {
    fn pipeline_use_case(
        &self,
        name: &str,
        stages: &[String],
        concurrency: Option<usize>,
        runs: Option<u32>,
        resume: bool,
    ) -> Result<Arc<RunPipelineUseCase>> {
        let mut pipeline = self.registry.pipeline(name)?;
        if !stages.is_empty() {
            let names: Vec<&str> = stages.iter().map(String::as_str).collect();
            pipeline = pipeline.subset(format!("{}:{}", name, names.join(",")), &names)?;
        }

        let params = self
            .config
            .batch
            .to_batch_params()
            .with_concurrency(concurrency.unwrap_or(self.config.batch.concurrency))
            .with_stage_parameter(runs)
            .with_resume(resume || self.config.batch.resume);

        Ok(Arc::new(
            RunPipelineUseCase::new(pipeline)
                .with_params(params)
                .with_store(Arc::clone(&self.store))
                .with_progress(Arc::clone(&self.progress))
                .with_logger(Arc::clone(&self.logger)),
        ))
    }

    async fn run(
        &self,
        loan_ids: Vec<String>,
        pipeline: Option<String>,
        concurrency: Option<usize>,
        runs: Option<u32>,
        resume: bool,
    ) -> Result<String> {
        let name = pipeline.unwrap_or_else(|| self.config.batch.pipeline.clone());
        let use_case = self.pipeline_use_case(&name, &[], concurrency, runs, resume)?;

        let loan_ids: Vec<LoanId> = if loan_ids.is_empty() {
            self.store.discover(&use_case.pipeline().definition().requires)?
        } else {
            loan_ids.into_iter().map(LoanId::new).collect()
        };
        if loan_ids.is_empty() {
            warn!("No loans ready for pipeline '{}'", name);
        }

        let concurrency = use_case.params().concurrency;
        let output = RunBatchUseCase::new(use_case)
            .with_cancellation(self.token.clone())
            .execute(RunBatchInput::new(loan_ids, concurrency))
            .await?;

        Ok(ConsoleFormatter::render(self.format, &output.summary, |s| {
            ConsoleFormatter::format_batch(&name, s)
        }))
    }

    async fn retry(
        &self,
        loan_ids: Vec<String>,
        pipeline: Option<String>,
        stages: Vec<String>,
        concurrency: Option<usize>,
        runs: Option<u32>,
    ) -> Result<String> {
        let name = pipeline.unwrap_or_else(|| self.config.batch.retry_pipeline.clone());
        let use_case = self.pipeline_use_case(&name, &stages, concurrency, runs, false)?;
        let concurrency = use_case.params().concurrency;

        let output = RetryFailedUseCase::new(use_case)
            .with_cancellation(self.token.clone())
            .execute(RetryFailedInput::new(loan_ids, concurrency))
            .await?;

        Ok(ConsoleFormatter::render(
            self.format,
            &output.report,
            ConsoleFormatter::format_retry,
        ))
    }

    async fn sample(&self, loan_id: String, runs: Option<usize>) -> Result<String> {
        let params = self.config.extractor.to_sampling_params();
        let sample_size = runs.unwrap_or(params.sample_size);
        let extractor = Arc::new(CommandExtractor::from_config(&self.config.extractor));

        let summary = SampleConsistencyUseCase::new(extractor, params)
            .with_store(Arc::clone(&self.store))
            .with_progress(Arc::clone(&self.progress))
            .execute_with_size(&LoanId::new(loan_id), sample_size)
            .await?;

        Ok(ConsoleFormatter::render(
            self.format,
            &summary,
            ConsoleFormatter::format_consistency,
        ))
    }

    async fn summarize(&self, loan_id: String) -> Result<String> {
        let summary = SummarizeUseCase::new(
            Arc::clone(&self.store),
            self.config.extractor.to_sampling_params(),
        )
        .execute(&LoanId::new(loan_id))
        .await?;

        Ok(ConsoleFormatter::render(
            self.format,
            &summary,
            ConsoleFormatter::format_consistency,
        ))
    }

    fn compare(&self, out_dir: Option<&Path>) -> Result<String> {
        let table = CompareIncomeUseCase::new(Arc::clone(&self.store)).execute()?;
        let dir = out_dir.unwrap_or(&self.config.store.aggregate_dir);
        let csv = write_comparison_csv(&table, dir)?;
        info!("Comparison written to {}", csv.display());

        let sample_size = self.config.extractor.sample_size;
        Ok(ConsoleFormatter::render(self.format, &table, |t| {
            ConsoleFormatter::format_comparison(t, sample_size, Some(&csv))
        }))
    }

    fn audit(&self, top: usize) -> Result<String> {
        let audit = AuditTimelinesUseCase::new(Arc::clone(&self.store)).execute()?;
        Ok(ConsoleFormatter::render(self.format, &audit, |a| {
            ConsoleFormatter::format_audit(a, top)
        }))
    }

    fn discover(&self, pipeline: Option<String>) -> Result<String> {
        let name = pipeline.unwrap_or_else(|| self.config.batch.pipeline.clone());
        let definition = self.registry.definition(&name)?;
        let loan_ids = self.store.discover(&definition.requires)?;
        Ok(ConsoleFormatter::render(self.format, &loan_ids, |ids| {
            ConsoleFormatter::format_discovery(&name, ids)
        }))
    }
}
