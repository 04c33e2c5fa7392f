//! Output formatter trait

use relay_application::{ProcessOutcome, TurnResults};
use relay_domain::ReconciledResult;

/// Trait for formatting the results of a turn
pub trait OutputFormatter {
    /// Format both channels and the processor outcomes
    fn format(&self, results: &TurnResults, outcomes: &[ProcessOutcome]) -> String;

    /// Format as JSON
    fn format_json(&self, results: &TurnResults, outcomes: &[ProcessOutcome]) -> String;

    /// Format the primary answer only (concise output)
    fn format_answer_only(&self, results: &TurnResults) -> String;

    /// Format the results of an auxiliary batch
    fn format_batch(&self, results: &[ReconciledResult]) -> String;
}
