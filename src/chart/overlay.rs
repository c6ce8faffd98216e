use std::collections::{HashMap, HashSet};

use crate::model::point::{ChartPoint, MarkerIdentity};

/// What changed on the chart surface when a marker batch was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayDiff {
    /// Shown before, absent from the new batch.
    pub stale: Vec<MarkerIdentity>,
    /// Present in both; the old overlay was removed before the new one was added.
    pub replaced: Vec<MarkerIdentity>,
    pub added: Vec<MarkerIdentity>,
}

impl OverlayDiff {
    pub fn is_empty(&self) -> bool {
        self.stale.is_empty() && self.replaced.is_empty() && self.added.is_empty()
    }
}

/// Buy/sell overlays currently on display, at most one per identity.
#[derive(Debug, Clone, Default)]
pub struct OverlaySet {
    order: Vec<MarkerIdentity>,
    by_id: HashMap<MarkerIdentity, ChartPoint>,
}

impl OverlaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, identity: &MarkerIdentity) -> Option<&ChartPoint> {
        self.by_id.get(identity)
    }

    /// Overlays in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &ChartPoint> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Remove-then-add a single marker. Non-marker points are ignored.
    /// Returns true when an overlay with the same identity was replaced.
    pub fn upsert(&mut self, point: ChartPoint) -> bool {
        let Some(identity) = point.identity.clone() else {
            return false;
        };
        let replaced = self.remove(&identity);
        self.order.push(identity.clone());
        self.by_id.insert(identity, point);
        replaced
    }

    pub fn remove(&mut self, identity: &MarkerIdentity) -> bool {
        if self.by_id.remove(identity).is_none() {
            return false;
        }
        self.order.retain(|id| id != identity);
        true
    }

    /// Swap the displayed overlays for a freshly reconciled batch. Within the
    /// batch, the last marker for an identity wins.
    pub fn replace_batch<I>(&mut self, markers: I) -> OverlayDiff
    where
        I: IntoIterator<Item = ChartPoint>,
    {
        let mut incoming: Vec<ChartPoint> = Vec::new();
        let mut index: HashMap<MarkerIdentity, usize> = HashMap::new();
        for point in markers {
            let Some(identity) = point.identity.clone() else {
                continue;
            };
            match index.get(&identity) {
                Some(&i) => incoming[i] = point,
                None => {
                    index.insert(identity, incoming.len());
                    incoming.push(point);
                }
            }
        }

        let incoming_ids: HashSet<&MarkerIdentity> = index.keys().collect();
        let mut diff = OverlayDiff::default();
        for id in &self.order {
            if !incoming_ids.contains(id) {
                diff.stale.push(id.clone());
            }
        }
        for id in diff.stale.iter() {
            self.by_id.remove(id);
        }
        self.order.retain(|id| incoming_ids.contains(id));

        for point in incoming {
            let Some(identity) = point.identity.clone() else {
                continue;
            };
            if self.upsert(point) {
                diff.replaced.push(identity);
            } else {
                diff.added.push(identity);
            }
        }
        diff
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.by_id.clear();
    }
}
