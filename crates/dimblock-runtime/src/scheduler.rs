use std::collections::{BTreeMap, VecDeque};

use dimblock_blocks::BlockKey;
use dimblock_geom::Location;

/// A deferred tick waiting for its due tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickRequest {
    pub id: u64,
    pub location: Location,
    pub key: BlockKey,
    pub due: u64,
}

/// Tick-bucketed queue of deferred block ticks.
///
/// Buckets are keyed by due tick and drained FIFO, so shorter delays fire first and
/// requests due on the same tick fire in submission order. There is no cancel: the
/// registry drops a request when it fires against a different occupant.
pub struct DeferredTickScheduler {
    by_tick: BTreeMap<u64, VecDeque<TickRequest>>,
    now: u64,
    next_id: u64,
}

impl Default for DeferredTickScheduler {
    fn default() -> Self {
        Self {
            by_tick: BTreeMap::new(),
            now: 0,
            next_id: 1,
        }
    }
}

impl DeferredTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    #[inline]
    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Queues a tick `delay` ticks from now. A delay of 0 still waits for the next tick.
    pub fn schedule(&mut self, location: Location, key: BlockKey, delay: u64) -> u64 {
        let id = self.alloc_id();
        let due = self.now.saturating_add(delay.max(1));
        log::trace!(target: "scheduler", "[tick {}] queued #{} {} at {} for tick {}", self.now, id, key, location, due);
        self.by_tick.entry(due).or_default().push_back(TickRequest {
            id,
            location,
            key,
            due,
        });
        id
    }

    /// Next request due at or before the current tick.
    pub fn pop_due(&mut self) -> Option<TickRequest> {
        loop {
            let mut entry = self.by_tick.first_entry()?;
            if *entry.key() > self.now {
                return None;
            }
            match entry.get_mut().pop_front() {
                Some(req) => return Some(req),
                None => {
                    entry.remove();
                }
            }
        }
    }

    pub fn advance_tick(&mut self) {
        if self.by_tick.get(&self.now).is_some_and(VecDeque::is_empty) {
            self.by_tick.remove(&self.now);
        }
        self.now = self.now.wrapping_add(1);
    }

    pub fn pending(&self) -> usize {
        self.by_tick.values().map(VecDeque::len).sum()
    }

    /// Drops every queued request. The tick counter keeps running.
    pub fn clear(&mut self) {
        self.by_tick.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimblock_geom::WorldId;

    fn at(x: i32) -> Location {
        Location::new(WorldId(0), x, 64, 0)
    }

    fn key() -> BlockKey {
        "demo:lamp".parse().unwrap()
    }

    #[test]
    fn zero_delay_waits_for_next_tick() {
        let mut s = DeferredTickScheduler::new();
        s.schedule(at(0), key(), 0);
        assert!(s.pop_due().is_none());
        s.advance_tick();
        let req = s.pop_due().unwrap();
        assert_eq!(req.due, 1);
        assert!(s.pop_due().is_none());
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn same_tick_requests_keep_submission_order() {
        let mut s = DeferredTickScheduler::new();
        let a = s.schedule(at(0), key(), 2);
        let b = s.schedule(at(1), key(), 1);
        let c = s.schedule(at(2), key(), 2);
        assert_eq!(s.pending(), 3);
        s.advance_tick();
        assert_eq!(s.pop_due().map(|r| r.id), Some(b));
        assert!(s.pop_due().is_none());
        s.advance_tick();
        assert_eq!(s.pop_due().map(|r| r.id), Some(a));
        assert_eq!(s.pop_due().map(|r| r.id), Some(c));
        assert!(s.pop_due().is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let mut s = DeferredTickScheduler::new();
        s.schedule(at(0), key(), 5);
        s.advance_tick();
        s.clear();
        assert_eq!(s.pending(), 0);
        assert_eq!(s.now(), 1);
    }
}
