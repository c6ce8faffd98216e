use serde_json::Value;

use crate::chart::overlay::{OverlayDiff, OverlaySet};
use crate::chart::{Reconciler, Reconciliation};
use crate::error::ChartError;

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied {
        points: usize,
        skipped: usize,
        overlays: OverlayDiff,
    },
    /// A newer request already resolved; this response was dropped.
    Stale { seq: u64, latest: u64 },
}

/// Chart state for one stock: the latest reconciled batch plus the overlays
/// on display. Every fetch gets a sequence number so that a slow response
/// can never overwrite a newer one.
#[derive(Debug, Clone, Default)]
pub struct ChartSession {
    reconciler: Reconciler,
    current: Reconciliation,
    overlays: OverlaySet,
    next_seq: u64,
    applied_seq: Option<u64>,
    resolved_seq: Option<u64>,
    last_error: Option<String>,
}

impl ChartSession {
    pub fn new(reconciler: Reconciler) -> Self {
        Self {
            reconciler,
            ..Self::default()
        }
    }

    /// Register a new outstanding fetch and return its sequence number.
    pub fn begin_fetch(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// True while the most recently issued fetch has not resolved.
    pub fn loading(&self) -> bool {
        self.next_seq > 0 && self.resolved_seq.map_or(true, |s| s < self.next_seq)
    }

    /// A response is stale once any request at least as new has resolved,
    /// whether it succeeded or failed.
    fn is_stale(&self, seq: u64) -> bool {
        self.resolved_seq.is_some_and(|resolved| seq <= resolved)
    }

    fn resolve(&mut self, seq: u64) {
        self.resolved_seq = Some(self.resolved_seq.map_or(seq, |s| s.max(seq)));
    }

    /// Reconcile a response and, unless it is stale, replace the in-memory
    /// batch wholesale. A structurally invalid payload leaves the previous
    /// batch on screen and is returned as an error.
    pub fn apply_payload(&mut self, seq: u64, payload: &Value) -> Result<ApplyOutcome, ChartError> {
        if self.is_stale(seq) {
            let latest = self.resolved_seq.unwrap_or_default();
            tracing::debug!(seq, latest, "Discarding stale minute data response");
            return Ok(ApplyOutcome::Stale { seq, latest });
        }
        self.resolve(seq);

        let reconciliation = match self.reconciler.reconcile_json(payload) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(seq, error = %e, "Rejected minute data response");
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let overlays = self
            .overlays
            .replace_batch(reconciliation.markers().cloned());
        let outcome = ApplyOutcome::Applied {
            points: reconciliation.points.len(),
            skipped: reconciliation.skipped(),
            overlays,
        };
        tracing::info!(
            seq,
            points = reconciliation.points.len(),
            skipped = reconciliation.skipped(),
            unclassified = reconciliation.unclassified,
            "Applied minute data"
        );
        self.current = reconciliation;
        self.applied_seq = Some(seq);
        self.last_error = None;
        Ok(outcome)
    }

    /// Record a failed fetch. Returns false if a newer request resolved first.
    pub fn fail_fetch(&mut self, seq: u64, error: &str) -> bool {
        if self.is_stale(seq) {
            return false;
        }
        self.resolve(seq);
        self.last_error = Some(error.to_string());
        true
    }

    pub fn current(&self) -> &Reconciliation {
        &self.current
    }

    pub fn overlays(&self) -> &OverlaySet {
        &self.overlays
    }

    pub fn applied_seq(&self) -> Option<u64> {
        self.applied_seq
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Records dropped from the batch on screen.
    pub fn skipped_records(&self) -> usize {
        self.current.skipped()
    }
}
