//! Crawl frontier: visited set, pending queue and depth counter
//!
//! The frontier is owned by the controller and mutated only by it. It keeps
//! these invariants:
//! - a URL enters the visited set at most once
//! - a URL is never both visited and pending
//! - after [`Frontier::advance_depth`] the pending queue holds at most
//!   `max_queue_size` entries
//! - the depth counter only grows

use crate::config::TraversalOrder;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Visited set plus the ordered queue of URLs for the depth being built
#[derive(Debug)]
pub struct Frontier {
    /// URLs that have been claimed for fetching
    visited: HashSet<String>,

    /// URLs awaiting fetch, in discovery order
    pending: Vec<String>,

    /// Membership index over `pending`
    pending_set: HashSet<String>,

    /// Number of completed depth levels
    depth: u32,

    max_pages: usize,
    max_queue_size: usize,
    order: TraversalOrder,
}

impl Frontier {
    /// Creates a frontier whose pending queue holds only the seed
    pub fn initialize(
        seed_url: &str,
        max_pages: usize,
        max_queue_size: usize,
        order: TraversalOrder,
    ) -> Self {
        let mut frontier = Self {
            visited: HashSet::new(),
            pending: Vec::new(),
            pending_set: HashSet::new(),
            depth: 0,
            max_pages,
            max_queue_size,
            order,
        };
        frontier.try_enqueue(seed_url);
        frontier
    }

    /// Drains and returns the pending queue for the current depth
    ///
    /// The returned batch is already in traversal order: shuffling (if any)
    /// happened in [`Frontier::advance_depth`].
    pub fn next_batch(&mut self) -> Vec<String> {
        self.pending_set.clear();
        std::mem::take(&mut self.pending)
    }

    /// Adds a URL to the pending queue if it is neither visited nor pending
    ///
    /// Returns whether the URL was accepted.
    pub fn try_enqueue(&mut self, url: &str) -> bool {
        if self.visited.contains(url) || self.pending_set.contains(url) {
            return false;
        }
        self.pending_set.insert(url.to_string());
        self.pending.push(url.to_string());
        true
    }

    /// Claims a URL for fetching
    ///
    /// Returns false if the URL was already visited. A URL that is still
    /// pending is removed from the queue so it cannot be fetched twice.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        if !self.visited.insert(url.to_string()) {
            return false;
        }
        if self.pending_set.remove(url) {
            self.pending.retain(|pending| pending != url);
        }
        true
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.pending_set.contains(url)
    }

    /// Pages that may still be fetched
    pub fn remaining_budget(&self) -> usize {
        self.max_pages.saturating_sub(self.visited.len())
    }

    /// Truncates a batch to the configured queue size, dropping entries from the tail
    ///
    /// Tail truncation is lossy: links discovered late in a depth level are
    /// the ones discarded. Under shuffled traversal which links survive
    /// differs between runs.
    pub fn cap_batch(&self, mut batch: Vec<String>) -> Vec<String> {
        if batch.len() > self.max_queue_size {
            tracing::debug!(
                "Queue cap: keeping {} of {} URLs",
                self.max_queue_size,
                batch.len()
            );
            batch.truncate(self.max_queue_size);
        }
        batch
    }

    /// Closes the current depth level
    ///
    /// Increments the depth counter, shuffles the pending queue in shuffled
    /// mode, then applies the queue-size cap.
    pub fn advance_depth<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.depth += 1;

        let mut pending = std::mem::take(&mut self.pending);
        if self.order == TraversalOrder::Shuffled {
            pending.shuffle(rng);
        }
        self.pending = self.cap_batch(pending);
        self.pending_set = self.pending.iter().cloned().collect();
    }

    /// Number of completed depth levels
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
