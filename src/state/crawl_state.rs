/// Crawl lifecycle state definitions
///
/// This module defines the states a crawl moves through and which
/// transitions between them are legal.
use crate::HarvestError;
use std::fmt;

/// Represents the lifecycle state of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Constructed, frontier not yet seeded
    Idle,

    /// Frontier seeded; depth levels are being processed
    Running,

    /// A termination condition was met; the result has been handed off
    Terminated,
}

impl CrawlState {
    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// The only legal path is `Idle → Running → Terminated`. `Idle → Terminated`
    /// is also allowed so that a crawl whose setup fails can still be closed.
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Terminated)
                | (Self::Idle, Self::Terminated)
        )
    }

    /// Performs a transition, failing on an illegal one
    pub fn transition(&mut self, next: CrawlState) -> Result<(), HarvestError> {
        if !self.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        tracing::debug!("Crawl state: {} -> {}", self, next);
        *self = next;
        Ok(())
    }

    /// Returns true once the crawl can no longer do any work
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
