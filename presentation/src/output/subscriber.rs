//! Console notification subscriber

use crate::output::console::ConsoleFormatter;
use relay_application::{ResultSubscriber, SubscriberError};
use relay_domain::ReconciledResult;

/// Prints a one-line notice to stderr for every published result.
///
/// Stderr keeps the notices out of piped primary output.
pub struct ConsoleSubscriber;

impl ResultSubscriber for ConsoleSubscriber {
    fn name(&self) -> &str {
        "console"
    }

    fn on_result(&self, result: &ReconciledResult) -> Result<(), SubscriberError> {
        eprintln!("{}", ConsoleFormatter::format_notification(result));
        Ok(())
    }
}
