// src/rain/embed.rs

//! Decides when the next text fragment is woven into the rain.

use crate::clock::Clock;
use log::{debug, info};
use std::rc::Rc;

/// Hands out a fixed sequence of fragments, at most one per `min_interval_ms`.
///
/// Sampled synchronously whenever a row is generated, so an embed only ever
/// starts on a row boundary. Once every fragment has been handed out the
/// scheduler stays exhausted.
pub struct TextEmbedScheduler {
    fragments: Vec<String>,
    next: usize,
    last_embed_ms: u64,
    min_interval_ms: u64,
    clock: Rc<dyn Clock>,
}

impl TextEmbedScheduler {
    /// The interval is measured from construction for the first fragment.
    pub fn new(fragments: Vec<String>, min_interval_ms: u64, clock: Rc<dyn Clock>) -> Self {
        if fragments.is_empty() {
            info!("TextEmbedScheduler: no fragments, embedding disabled");
        } else {
            info!(
                "TextEmbedScheduler: {} fragments, one every {} ms at most",
                fragments.len(),
                min_interval_ms
            );
        }
        let last_embed_ms = clock.now_ms();
        Self {
            fragments,
            next: 0,
            last_embed_ms,
            min_interval_ms,
            clock,
        }
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_exhausted(&self) -> bool {
        self.next >= self.fragments.len()
    }

    /// Returns the next fragment if one is due.
    pub fn maybe_embed(&mut self) -> Option<&str> {
        if self.is_exhausted() {
            return None;
        }
        let now = self.clock.now_ms();
        if now.saturating_sub(self.last_embed_ms) < self.min_interval_ms {
            return None;
        }

        let index = self.next;
        self.next += 1;
        self.last_embed_ms = now;
        debug!(
            "TextEmbedScheduler: fragment {}/{} due at {} ms",
            index + 1,
            self.fragments.len(),
            now
        );
        Some(&self.fragments[index])
    }
}
