//! Interventions awaiting feedback.
//!
//! Entries expire after a time-to-live and the map is capacity-bounded, so
//! interventions whose feedback never arrives are eventually reclaimed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use fokuslern_core::{Action, Activity, State};
use time::{Duration, OffsetDateTime};

/// An intervention shown to the user, kept until feedback arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingIntervention {
    pub state: State,
    pub action: Action,
    pub created_at: OffsetDateTime,
    pub activity: Activity,
}

impl PendingIntervention {
    /// Minutes elapsed between creation and `now`, never negative.
    #[must_use]
    pub fn age_minutes(&self, now: OffsetDateTime) -> f64 {
        ((now - self.created_at).as_seconds_f64() / 60.0).max(0.0)
    }
}

#[derive(Debug)]
pub struct PendingInterventions {
    entries: HashMap<String, PendingIntervention>,
    ttl: Duration,
    capacity: usize,
}

impl PendingInterventions {
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Registers an intervention. Expired entries are dropped first; at
    /// capacity the oldest entry makes room.
    pub fn insert(&mut self, id: String, intervention: PendingIntervention, now: OffsetDateTime) {
        self.expire(now);
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by(|a, b| a.1.created_at.cmp(&b.1.created_at).then_with(|| a.0.cmp(b.0)))
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
        }
        self.entries.insert(id, intervention);
    }

    /// Removes and returns the intervention, unless unknown or expired.
    pub fn take(&mut self, id: &str, now: OffsetDateTime) -> Option<PendingIntervention> {
        self.expire(now);
        self.entries.remove(id)
    }

    /// Drops entries older than the TTL; returns how many were dropped.
    pub fn expire(&mut self, now: OffsetDateTime) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, p| now - p.created_at <= ttl);
        before - self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }
}

/// Intervention ids: Unix time in nanoseconds, bumped when necessary so
/// every id is strictly greater than the previous one.
#[derive(Debug, Default)]
pub struct InterventionIds {
    last: AtomicU64,
}

impl InterventionIds {
    pub fn next(&self, now: OffsetDateTime) -> String {
        let candidate = u64::try_from(now.unix_timestamp_nanos()).unwrap_or(0);
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let id = candidate.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, id, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return id.to_string(),
                Err(current) => last = current,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fokuslern_core::ActivityContext;
    use time::macros::datetime;

    fn pending(at: OffsetDateTime) -> PendingIntervention {
        PendingIntervention {
            state: State::encode_at(&Activity::default(), &ActivityContext::default(), at),
            action: Action::GentleReminder,
            created_at: at,
            activity: Activity::default(),
        }
    }

    #[test]
    fn take_consumes_once() {
        let t0 = datetime!(2024-05-06 09:00:00 UTC);
        let mut map = PendingInterventions::new(Duration::minutes(60), 10);
        map.insert("a".into(), pending(t0), t0);
        assert!(map.take("a", t0 + Duration::minutes(1)).is_some());
        assert!(map.take("a", t0 + Duration::minutes(1)).is_none());
        assert!(map.take("never", t0).is_none());
    }

    #[test]
    fn expired_entries_are_reclaimed() {
        let t0 = datetime!(2024-05-06 09:00:00 UTC);
        let mut map = PendingInterventions::new(Duration::minutes(60), 10);
        map.insert("old".into(), pending(t0), t0);
        map.insert("new".into(), pending(t0 + Duration::minutes(50)), t0 + Duration::minutes(50));
        assert_eq!(map.expire(t0 + Duration::minutes(61)), 1);
        assert!(!map.contains("old"));
        assert!(map.take("new", t0 + Duration::minutes(61)).is_some());
    }

    #[test]
    fn capacity_evicts_oldest() {
        let t0 = datetime!(2024-05-06 09:00:00 UTC);
        let mut map = PendingInterventions::new(Duration::hours(4), 2);
        map.insert("1".into(), pending(t0), t0);
        map.insert("2".into(), pending(t0 + Duration::seconds(1)), t0 + Duration::seconds(1));
        map.insert("3".into(), pending(t0 + Duration::seconds(2)), t0 + Duration::seconds(2));
        assert_eq!(map.len(), 2);
        assert!(!map.contains("1"));
        assert!(map.contains("3"));
    }

    #[test]
    fn ids_are_strictly_increasing_for_the_same_instant() {
        let ids = InterventionIds::default();
        let t0 = datetime!(2024-05-06 09:00:00 UTC);
        let a: u64 = ids.next(t0).parse().unwrap_or_default();
        let b: u64 = ids.next(t0).parse().unwrap_or_default();
        let c: u64 = ids.next(t0 - Duration::seconds(5)).parse().unwrap_or_default();
        assert!(a < b && b < c);
    }

    #[test]
    fn age_is_measured_in_minutes() {
        let t0 = datetime!(2024-05-06 09:00:00 UTC);
        let p = pending(t0);
        assert!((p.age_minutes(t0 + Duration::seconds(90)) - 1.5).abs() < 1e-9);
        assert!(p.age_minutes(t0 - Duration::minutes(1)).abs() < f64::EPSILON);
    }
}
