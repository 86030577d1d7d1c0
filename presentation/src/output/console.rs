//! Console output formatter for batch and store-wide reports

use colored::{ColoredString, Colorize};
use loanflow_domain::{
    BatchSummary, BorrowerConsistency, ComparisonTable, ConfidenceTier, ConsistencySummary,
    LoanId, OutcomeKind, OutputFormat, RetryReport, TimelineAudit, truncate_detail,
};
use serde::Serialize;
use std::path::Path;

/// Width of reasons in bucket listings
const REASON_WIDTH: usize = 100;

/// Formats reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Turn ANSI colors off for the whole process.
    pub fn configure_color(enabled: bool) {
        if !enabled {
            colored::control::set_override(false);
        }
    }

    /// Render `value` as JSON, or as text via `text`.
    pub fn render<T: Serialize>(
        format: OutputFormat,
        value: &T,
        text: impl FnOnce(&T) -> String,
    ) -> String {
        match format {
            OutputFormat::Text => text(value),
            OutputFormat::Json => Self::format_json(value),
        }
    }

    pub fn format_json<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    /// End-of-run summary: counts per bucket, then each non-success loan.
    pub fn format_batch(pipeline: &str, summary: &BatchSummary) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(&format!("Batch Summary: {}", pipeline)));
        output.push('\n');

        output.push_str(&format!(
            "{} {}   {} {:.1}s\n\n",
            "Total loans:".cyan().bold(),
            summary.total,
            "Duration:".cyan().bold(),
            summary.duration.as_secs_f64()
        ));

        for kind in OutcomeKind::ALL {
            output.push_str(&format!(
                "  {:<12} {:>5}  ({:>5.1}%)\n",
                Self::paint(kind, kind.display_name()),
                summary.count(kind),
                summary.percentage(kind)
            ));
        }

        for kind in [OutcomeKind::Timeout, OutcomeKind::Failure, OutcomeKind::NoData] {
            let entries = summary.entries(kind);
            if entries.is_empty() {
                continue;
            }
            output.push_str(&Self::section_header(kind.display_name()));
            for entry in entries {
                let stage = entry.stage.as_deref().unwrap_or("-");
                output.push_str(&format!(
                    "  {} [{}] {}\n",
                    entry.loan_id.as_str().bold(),
                    stage.yellow(),
                    truncate_detail(&entry.reason, REASON_WIDTH)
                ));
            }
        }

        let retry = summary.unsuccessful_ids();
        if !retry.is_empty() {
            output.push_str(&format!(
                "\n{} loanflow retry {}\n",
                "Retry with:".dimmed(),
                Self::join_ids(retry.iter())
            ));
        }

        output.push_str(&Self::footer());
        output
    }

    pub fn format_retry(report: &RetryReport) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(&format!("Retry: {}", report.pipeline)));
        output.push('\n');

        output.push_str(&format!(
            "{} {}/{}\n",
            "Recovered:".green().bold(),
            report.succeeded.len(),
            report.total()
        ));
        if !report.succeeded.is_empty() {
            output.push_str(&format!("  {}\n", Self::join_ids(report.succeeded.iter())));
        }

        if !report.still_failed.is_empty() {
            output.push_str(&Self::section_header("Still failing"));
            for entry in &report.still_failed {
                output.push_str(&format!(
                    "  {} [{}] {}\n",
                    entry.loan_id.as_str().bold(),
                    entry.stage.as_deref().unwrap_or("-").yellow(),
                    truncate_detail(&entry.reason, REASON_WIDTH)
                ));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    pub fn format_consistency(summary: &ConsistencySummary) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(&format!("Consistency: loan {}", summary.loan_id)));
        output.push('\n');

        output.push_str(&format!(
            "{} {} ({})\n",
            "Runs:".cyan().bold(),
            summary.total_runs,
            summary.run_range
        ));

        output.push_str(&Self::section_header("Agreement"));
        for agreement in &summary.agreement {
            let values = agreement
                .distinct_values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            output.push_str(&format!(
                "  {:<24} {}/{} {}  [{}]\n",
                agreement.field,
                agreement.high_confidence_count,
                agreement.sample_size,
                Self::paint_tier(agreement.tier),
                values
            ));
        }

        if let Some(stats) = &summary.statistics {
            output.push_str(&Self::section_header("Statistics"));
            output.push_str(&format!(
                "  mean {:.2}  median {:.2}  min {:.2} (run {})  max {:.2} (run {})\n",
                stats.mean,
                stats.median,
                stats.min,
                stats.min_run_number,
                stats.max,
                stats.max_run_number
            ));
            output.push_str(&format!(
                "  spread {:.2} ({:.2}%)\n",
                stats.spread, stats.spread_pct
            ));
        }

        if let Some(decision) = &summary.underwriter_decision {
            let dist = &decision.confidence_distribution;
            output.push_str(&Self::section_header("Underwriter Decision"));
            output.push_str(&format!(
                "  {} ${:.2}\n",
                "Authoritative income:".bold(),
                decision.authoritative_income
            ));
            output.push_str(&format!(
                "  runs high/medium/low: {}/{}/{}  confidence: {}\n",
                dist.high,
                dist.medium,
                dist.low,
                decision.confidence_in_result.as_str()
            ));
            output.push_str(&format!("  {}\n", decision.recommendation));
        }

        let failed: Vec<_> = summary.results.iter().filter(|s| s.is_error()).collect();
        if !failed.is_empty() {
            output.push_str(&Self::section_header("Failed runs"));
            for sample in failed {
                output.push_str(&format!(
                    "  run {}: {}\n",
                    sample.run_number().unwrap_or(0),
                    truncate_detail(sample.error().unwrap_or("unknown error"), REASON_WIDTH)
                        .red()
                ));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Headline figures of the comparison; the rows themselves go to CSV.
    pub fn format_comparison(
        table: &ComparisonTable,
        sample_size: usize,
        csv: Option<&Path>,
    ) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Income Comparison"));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Loans compared:".cyan().bold(), table.rows.len()));
        output.push_str(&format!(
            "  skipped without consistency data: {}\n  skipped without form income:      {}\n",
            table.skipped_no_ai, table.skipped_no_form
        ));
        if !table.rows.is_empty() {
            output.push_str(&format!(
                "  mean |median vs form|:            {:.2}%\n  all {} runs agree:                {}\n",
                table.mean_abs_pct(),
                sample_size,
                table.full_agreement_count(sample_size)
            ));
        }

        Self::push_issues(&mut output, &table.malformed);

        if let Some(path) = csv {
            output.push_str(&format!("\n{} {}\n", "Written:".dimmed(), path.display()));
        }
        output.push_str(&Self::footer());
        output
    }

    pub fn format_audit(audit: &TimelineAudit, top: usize) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Timeline Audit"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}   ({} without timeline)\n\n",
            "Timelines:".cyan().bold(),
            audit.entries.len(),
            audit.without_timeline
        ));
        output.push_str(&format!("  {:<14} {}\n", "consistent".green(), audit.consistent()));
        output.push_str(&format!("  {:<14} {}\n", "inconsistent".red(), audit.inconsistent()));
        output.push_str(&format!(
            "  {:<14} {}\n",
            "undetermined".yellow(),
            audit.undetermined()
        ));
        output.push_str(&format!(
            "  income changed {} / unchanged {}\n",
            audit.income_changed(),
            audit.income_unchanged()
        ));

        let inconsistent: Vec<_> = audit
            .entries
            .iter()
            .filter_map(|e| match &e.borrowers {
                BorrowerConsistency::Inconsistent { explanation } => Some((&e.loan_id, explanation)),
                _ => None,
            })
            .collect();
        if !inconsistent.is_empty() {
            output.push_str(&Self::section_header("Borrower changes"));
            for (loan_id, explanation) in inconsistent {
                output.push_str(&format!("  {} {}\n", loan_id.as_str().bold(), explanation));
            }
        }

        let largest = audit.largest_changes(top);
        if !largest.is_empty() {
            output.push_str(&Self::section_header("Largest income changes"));
            for entry in largest {
                if let Some(change) = entry.income_change {
                    let pct = format!("{:+.2}%", change.percent);
                    let pct = if change.percent < 0.0 { pct.red() } else { pct.green() };
                    output.push_str(&format!(
                        "  {} {:.2} -> {:.2}  {}\n",
                        entry.loan_id.as_str().bold(),
                        change.initial,
                        change.final_income,
                        pct
                    ));
                }
            }
        }

        Self::push_issues(&mut output, &audit.malformed);
        output.push_str(&Self::footer());
        output
    }

    pub fn format_discovery(pipeline: &str, loan_ids: &[LoanId]) -> String {
        let mut output = format!(
            "{} {} loans ready for '{}'\n",
            "->".cyan(),
            loan_ids.len(),
            pipeline
        );
        for id in loan_ids {
            output.push_str(&format!("  {}\n", id));
        }
        output
    }

    fn push_issues(output: &mut String, issues: &[loanflow_domain::ArtifactIssue]) {
        if issues.is_empty() {
            return;
        }
        output.push_str(&Self::section_header("Malformed artifacts"));
        for issue in issues {
            output.push_str(&format!(
                "  {} {}\n",
                issue.loan_id.as_str().bold(),
                truncate_detail(&issue.reason, REASON_WIDTH).red()
            ));
        }
    }

    fn paint(kind: OutcomeKind, text: &str) -> ColoredString {
        match kind {
            OutcomeKind::Success => text.green(),
            OutcomeKind::NoData => text.blue(),
            OutcomeKind::Timeout => text.yellow(),
            OutcomeKind::Failure => text.red(),
        }
    }

    fn paint_tier(tier: ConfidenceTier) -> ColoredString {
        match tier {
            ConfidenceTier::AllAgree => tier.as_str().green(),
            ConfidenceTier::Majority => tier.as_str().yellow(),
            ConfidenceTier::Low => tier.as_str().red(),
        }
    }

    fn join_ids<'a>(ids: impl Iterator<Item = &'a LoanId>) -> String {
        ids.map(LoanId::as_str).collect::<Vec<_>>().join(" ")
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
