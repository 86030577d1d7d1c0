//! Progress reporting for batch execution

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use loanflow_application::ports::progress::BatchProgressNotifier;
use loanflow_domain::{BatchSummary, LoanId, LoanOutcome, OutcomeKind, StageResult};
use std::sync::Mutex;

/// Reports batch progress with a progress bar
pub struct ProgressReporter {
    multi: MultiProgress,
    batch_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            batch_bar: Mutex::new(None),
        }
    }

    fn batch_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {elapsed_precise} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.batch_bar.lock()
            && let Some(pb) = guard.as_ref()
        {
            f(pb);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn mark(kind: OutcomeKind) -> String {
    match kind {
        OutcomeKind::Success => "v".green().to_string(),
        OutcomeKind::NoData => "-".blue().to_string(),
        OutcomeKind::Timeout => "t".yellow().to_string(),
        OutcomeKind::Failure => "x".red().to_string(),
    }
}

impl BatchProgressNotifier for ProgressReporter {
    fn on_batch_start(&self, pipeline: &str, total_loans: usize, concurrency: usize) {
        let pb = self.multi.add(ProgressBar::new(total_loans as u64));
        pb.set_style(Self::batch_style());
        pb.set_prefix(pipeline.to_string());
        pb.set_message(format!("{} at a time", concurrency));

        if let Ok(mut guard) = self.batch_bar.lock() {
            *guard = Some(pb);
        }
    }

    fn on_loan_start(&self, loan_id: &LoanId) {
        self.with_bar(|pb| pb.set_message(format!("{} started", loan_id)));
    }

    fn on_stage_complete(&self, result: &StageResult) {
        self.with_bar(|pb| {
            pb.set_message(format!("{} {} {}", mark(result.outcome), result.loan_id, result.stage))
        });
    }

    fn on_sample_complete(&self, loan_id: &LoanId, run: u32, success: bool) {
        let kind = if success {
            OutcomeKind::Success
        } else {
            OutcomeKind::Failure
        };
        self.with_bar(|pb| pb.set_message(format!("{} {} run {}", mark(kind), loan_id, run)));
    }

    fn on_loan_complete(&self, outcome: &LoanOutcome) {
        self.with_bar(|pb| {
            pb.set_message(format!("{} {}", mark(outcome.outcome), outcome.loan_id));
            pb.inc(1);
        });
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        if let Ok(mut guard) = self.batch_bar.lock()
            && let Some(pb) = guard.take()
        {
            pb.finish_with_message(format!(
                "{} {}/{} succeeded",
                "done".green(),
                summary.count(OutcomeKind::Success),
                summary.total
            ));
        }
    }
}

/// Line-per-event progress for terminals without cursor control
pub struct SimpleProgress;

impl BatchProgressNotifier for SimpleProgress {
    fn on_batch_start(&self, pipeline: &str, total_loans: usize, concurrency: usize) {
        eprintln!(
            "{} {} ({} loans, {} at a time)",
            "->".cyan(),
            pipeline.bold(),
            total_loans,
            concurrency
        );
    }

    fn on_sample_complete(&self, loan_id: &LoanId, run: u32, success: bool) {
        if !success {
            eprintln!("  {} {} run {} failed", "x".red(), loan_id, run);
        }
    }

    fn on_loan_complete(&self, outcome: &LoanOutcome) {
        match &outcome.stopped_at {
            Some(stage) => eprintln!(
                "  {} {} ({} at {})",
                mark(outcome.outcome),
                outcome.loan_id,
                outcome.outcome,
                stage
            ),
            None => eprintln!("  {} {}", mark(outcome.outcome), outcome.loan_id),
        }
    }

    fn on_batch_complete(&self, _summary: &BatchSummary) {
        eprintln!();
    }
}
