//! Breadth-first frontier and visited set for one crawl run

use std::collections::{HashSet, VecDeque};

/// URLs waiting to be fetched, plus every URL already handled
///
/// The queue may hold duplicates; they are dropped when dequeued. A URL is
/// marked visited once it was fetched, denied by robots.txt, or failed, so it
/// is never fetched twice in one run.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    visited: HashSet<String>,
    duplicates_skipped: usize,
}

impl Frontier {
    /// Creates a frontier holding only the seed URL
    pub fn new(seed: &str) -> Self {
        let mut frontier = Self::default();
        frontier.queue.push_back(seed.to_string());
        frontier
    }

    /// Appends discovered URLs to the back of the queue
    pub fn extend<I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.queue.extend(urls);
    }

    /// Pops URLs in FIFO order until one has not been visited yet
    pub fn next_unvisited(&mut self) -> Option<String> {
        while let Some(url) = self.queue.pop_front() {
            if self.visited.contains(&url) {
                self.duplicates_skipped += 1;
                continue;
            }
            return Some(url);
        }
        None
    }

    /// Records `url` as handled; returns false if it already was
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Read-only view of the visited set
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    /// Number of queued entries, duplicates included
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// How many dequeued entries were dropped as already visited
    pub fn duplicates_skipped(&self) -> usize {
        self.duplicates_skipped
    }
}
