//! Live rendering of a channel's text snapshot.
//!
//! Snapshots are cumulative and may rewrite earlier text, so the printer
//! only writes the new suffix when the snapshot extends what is already on
//! screen and starts a fresh line otherwise. The final result text is
//! trimmed, so a snapshot equal to the trimmed screen text is not a rewrite.

use std::io::{self, Write};
use tokio::sync::watch;

/// Writes successive text snapshots to `out`.
pub struct LiveText<W> {
    out: W,
    printed: String,
}

impl<W: Write> LiveText<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: String::new(),
        }
    }

    /// Render `snapshot`, writing as little as possible.
    pub fn update(&mut self, snapshot: &str) -> io::Result<()> {
        if snapshot == self.printed || (!snapshot.is_empty() && snapshot == self.printed.trim()) {
            return Ok(());
        }
        match snapshot.strip_prefix(self.printed.as_str()) {
            Some(suffix) => write!(self.out, "{suffix}")?,
            None => write!(self.out, "\n{snapshot}")?,
        }
        self.out.flush()?;
        self.printed = snapshot.to_string();
        Ok(())
    }

    /// Terminate the current line if it is still open.
    pub fn finish(&mut self) -> io::Result<()> {
        if !self.printed.is_empty() && !self.printed.ends_with('\n') {
            writeln!(self.out)?;
            self.out.flush()?;
        }
        Ok(())
    }

    pub fn printed(&self) -> &str {
        &self.printed
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Follow a text watch until its sender is dropped, rendering every
/// snapshot. The final snapshot is rendered before returning.
pub async fn follow<W: Write>(
    mut text: watch::Receiver<String>,
    out: W,
) -> io::Result<LiveText<W>> {
    let mut live = LiveText::new(out);
    loop {
        let snapshot = text.borrow_and_update().clone();
        live.update(&snapshot)?;
        if text.changed().await.is_err() {
            break;
        }
    }
    let last = text.borrow().clone();
    live.update(&last)?;
    live.finish()?;
    Ok(live)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(live: LiveText<Vec<u8>>) -> String {
        String::from_utf8(live.into_inner()).unwrap()
    }

    #[test]
    fn test_extending_snapshot_writes_suffix() {
        let mut live = LiveText::new(Vec::new());
        live.update("Hel").unwrap();
        live.update("Hello").unwrap();
        live.update("Hello").unwrap();
        assert_eq!(live.printed(), "Hello");
        assert_eq!(rendered(live), "Hello");
    }

    #[test]
    fn test_rewritten_snapshot_starts_new_line() {
        let mut live = LiveText::new(Vec::new());
        live.update("Helo").unwrap();
        live.update("Hello world").unwrap();
        live.finish().unwrap();
        assert_eq!(rendered(live), "Helo\nHello world\n");
    }

    #[test]
    fn test_trimmed_final_snapshot_is_not_reprinted() {
        let mut live = LiveText::new(Vec::new());
        live.update("\nHi there\n").unwrap();
        live.update("Hi there").unwrap();
        live.finish().unwrap();
        assert_eq!(rendered(live), "\nHi there\n");
    }

    #[tokio::test]
    async fn test_follow_does_not_repeat_trimmed_result() {
        let (tx, rx) = watch::channel(String::new());
        let task = tokio::spawn(follow(rx, Vec::new()));

        tx.send_replace("\nHi there".to_string());
        tokio::task::yield_now().await;
        tx.send_replace("Hi there".to_string());
        drop(tx);

        let text = rendered(task.await.unwrap().unwrap());
        assert_eq!(text.matches("Hi there").count(), 1);
        assert!(text.ends_with("Hi there\n"));
    }

    #[test]
    fn test_finish_on_empty_writes_nothing() {
        let mut live = LiveText::new(Vec::new());
        live.finish().unwrap();
        assert_eq!(rendered(live), "");
    }

    #[tokio::test]
    async fn test_follow_renders_until_sender_dropped() {
        let (tx, rx) = watch::channel(String::new());
        let task = tokio::spawn(follow(rx, Vec::new()));

        tx.send_replace("Hi".to_string());
        tokio::task::yield_now().await;
        tx.send_replace("Hi there".to_string());
        drop(tx);

        let live = task.await.unwrap().unwrap();
        assert_eq!(live.printed(), "Hi there");
        let text = rendered(live);
        assert!(text.ends_with("Hi there\n"));
        assert!(!text.contains("there there"));
    }
}
