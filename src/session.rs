//! Keeps only the newest analysis when several images are requested in turn.
//!
//! A host that analyses on a worker thread can receive results out of order:
//! the user flips to the next certificate while the previous one is still
//! being processed. Each request takes a [`RequestTicket`]; a finished
//! analysis is accepted only if its ticket is newer than the one stored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::engine::Analysis;

/// Sequence number handed out when an analysis is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    /// The raw sequence number.
    #[must_use]
    pub fn sequence(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Latest {
    ticket: Option<RequestTicket>,
    analysis: Option<Arc<Analysis>>,
}

/// Tracks requests and the most recent accepted result.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    next: AtomicU64,
    latest: Mutex<Latest>,
}

impl AnalysisSession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Whether `ticket` is the most recently issued request.
    #[must_use]
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.next.load(Ordering::Relaxed) == ticket.0
    }

    /// Offer a finished analysis. Returns `false` if it was discarded as stale.
    pub fn complete(&self, ticket: RequestTicket, analysis: Analysis) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if latest.ticket.is_some_and(|stored| stored >= ticket) {
            log::debug!(
                "discarding stale analysis #{} (have #{})",
                ticket.0,
                latest.ticket.map_or(0, RequestTicket::sequence)
            );
            return false;
        }
        latest.ticket = Some(ticket);
        latest.analysis = Some(Arc::new(analysis));
        true
    }

    /// The newest accepted analysis.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<Analysis>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .analysis
            .clone()
    }
}
