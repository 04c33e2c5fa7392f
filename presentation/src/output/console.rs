//! Console output formatter for turn results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use relay_application::{ProcessOutcome, TurnResults};
use relay_domain::{ReconciledResult, ResultStatus};
use serde_json::json;

/// Formats channel results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format both channels of a turn plus the processor outcomes
    pub fn format(results: &TurnResults, outcomes: &[ProcessOutcome]) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Turn Results"));
        output.push('\n');

        output.push_str(&Self::section_header("Primary"));
        output.push_str(&Self::format_result(&results.primary));

        if let Some(auxiliary) = &results.auxiliary {
            output.push_str(&Self::section_header("Auxiliary"));
            output.push_str(&Self::format_result(auxiliary));
        }

        if !outcomes.is_empty() {
            output.push_str(&Self::section_header("Processors"));
            for outcome in outcomes {
                output.push_str(&Self::format_outcome(outcome));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(results: &TurnResults, outcomes: &[ProcessOutcome]) -> String {
        let value = json!({
            "primary": results.primary,
            "auxiliary": results.auxiliary,
            "processors": outcomes,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the primary answer only (concise output)
    pub fn format_answer_only(results: &TurnResults) -> String {
        let primary = &results.primary;
        match primary.status {
            ResultStatus::Success => format!("{}\n", primary.text),
            ResultStatus::Error => format!(
                "{} {}\n",
                "Error:".red().bold(),
                primary.error.as_deref().unwrap_or("unknown")
            ),
        }
    }

    /// Format the results of an auxiliary batch, one block per query
    pub fn format_batch(results: &[ReconciledResult]) -> String {
        let mut output = Self::header("Batch Results");
        output.push('\n');
        for (index, result) in results.iter().enumerate() {
            output.push_str(&Self::section_header(&format!("#{} {}", index + 1, result.query)));
            output.push_str(&Self::format_result(result));
        }
        output.push_str(&Self::footer());
        output
    }

    /// Recorded results, oldest first, one notice line each
    pub fn format_history(results: &[ReconciledResult]) -> String {
        let mut output = Self::section_header(&format!("History ({})", results.len()));
        for result in results {
            output.push_str(&format!(
                "{} {}\n",
                result.finished_at.format("%H:%M:%S").to_string().dimmed(),
                Self::format_notification(result)
            ));
        }
        output
    }

    /// One-line notice for a result delivered through the notification bus
    pub fn format_notification(result: &ReconciledResult) -> String {
        let tag = format!("[{}]", result.channel);
        match result.status {
            ResultStatus::Success => format!(
                "{} {} {}",
                tag.dimmed(),
                "done".green(),
                Self::preview(&result.text, 60)
            ),
            ResultStatus::Error => format!(
                "{} {} {}",
                tag.dimmed(),
                "failed".red(),
                result.error.as_deref().unwrap_or("unknown")
            ),
        }
    }

    fn format_result(result: &ReconciledResult) -> String {
        let mut output = format!(
            "{} {}\n",
            "Request:".cyan().bold(),
            result.request_id.as_str().dimmed()
        );
        if !result.conversation_id.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                "Conversation:".cyan().bold(),
                result.conversation_id
            ));
        }
        match result.status {
            ResultStatus::Success => {
                output.push('\n');
                output.push_str(&Self::indent(&result.text, "  "));
                output.push('\n');
            }
            ResultStatus::Error => {
                output.push_str(&format!(
                    "\n  {} {}\n",
                    "Error:".red().bold(),
                    result.error.as_deref().unwrap_or("unknown")
                ));
            }
        }
        output
    }

    fn format_outcome(outcome: &ProcessOutcome) -> String {
        if outcome.success {
            let data = outcome
                .data
                .as_ref()
                .and_then(|d| serde_json::to_string_pretty(d).ok())
                .unwrap_or_default();
            format!(
                "\n{}\n{}\n",
                format!("── {} ──", outcome.processor).yellow().bold(),
                Self::indent(&data, "  ")
            )
        } else {
            format!(
                "\n{}\nError: {}\n",
                format!("── {} ──", outcome.processor).red().bold(),
                outcome.error.as_deref().unwrap_or("unknown")
            )
        }
    }

    fn preview(text: &str, max_chars: usize) -> String {
        let line = text.lines().next().unwrap_or_default();
        if line.chars().count() > max_chars || text.lines().nth(1).is_some() {
            let cut: String = line.chars().take(max_chars).collect();
            format!("{cut}…")
        } else {
            line.to_string()
        }
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

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, results: &TurnResults, outcomes: &[ProcessOutcome]) -> String {
        Self::format(results, outcomes)
    }

    fn format_json(&self, results: &TurnResults, outcomes: &[ProcessOutcome]) -> String {
        Self::format_json(results, outcomes)
    }

    fn format_answer_only(&self, results: &TurnResults) -> String {
        Self::format_answer_only(results)
    }

    fn format_batch(&self, results: &[ReconciledResult]) -> String {
        Self::format_batch(results)
    }
}
