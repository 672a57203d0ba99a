//! Triggers, the registry that indexes them, and their dispatch order.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use tableforge_protocol::TriggerId;

use crate::{Context, InvokeResult, Player};

/// The body of a trigger.
pub type Invoker = Arc<dyn Fn(&Context, &mut InvokeResult) + Send + Sync>;

/// A registered reaction to one or more named events.
pub struct Trigger {
    id: TriggerId,
    player: Option<Arc<Player>>,
    priority: f64,
    events: Vec<String>,
    invoker: Invoker,
}

impl Trigger {
    pub fn id(&self) -> TriggerId {
        self.id
    }

    /// The owning player; `None` for system triggers.
    pub fn player(&self) -> Option<&Arc<Player>> {
        self.player.as_ref()
    }

    /// Lower runs first.
    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// A trigger fires if it is a system trigger or its player is alive.
    pub fn is_eligible(&self) -> bool {
        self.player.as_ref().is_none_or(|p| p.is_alive())
    }

    pub(crate) fn call(&self, ctx: &Context, result: &mut InvokeResult) {
        (self.invoker)(ctx, result);
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("id", &self.id)
            .field("player", &self.player.as_ref().map(|p| p.order()))
            .field("priority", &self.priority)
            .field("events", &self.events)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Triggers keyed by id and indexed by event name.
///
/// Not thread-safe by itself; the runtime context keeps it behind a mutex
/// and never holds that mutex while a trigger runs.
#[derive(Default)]
pub(crate) struct TriggerRegistry {
    next_id: u64,
    by_id: HashMap<TriggerId, Arc<Trigger>>,
    by_event: HashMap<String, BTreeSet<TriggerId>>,
}

impl TriggerRegistry {
    /// Registers a trigger. Returns `None` if `events` is empty.
    pub(crate) fn add(
        &mut self,
        priority: f64,
        player: Option<Arc<Player>>,
        events: &[&str],
        invoker: Invoker,
    ) -> Option<TriggerId> {
        if events.is_empty() {
            return None;
        }
        self.next_id += 1;
        let id = TriggerId(self.next_id);
        let mut names: Vec<String> = events.iter().map(|e| e.to_string()).collect();
        names.sort();
        names.dedup();
        for name in &names {
            self.by_event.entry(name.clone()).or_default().insert(id);
        }
        self.by_id.insert(
            id,
            Arc::new(Trigger {
                id,
                player,
                priority,
                events: names,
                invoker,
            }),
        );
        Some(id)
    }

    /// Removes a trigger from both indexes. Unknown ids are ignored.
    pub(crate) fn remove(&mut self, id: TriggerId) -> bool {
        let Some(trigger) = self.by_id.remove(&id) else {
            return false;
        };
        for name in &trigger.events {
            if let Some(ids) = self.by_event.get_mut(name) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.by_event.remove(name);
                }
            }
        }
        true
    }

    pub(crate) fn contains(&self, id: TriggerId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Returns every live trigger indexed under `event`.
    pub(crate) fn collect(&self, event: &str) -> Vec<Arc<Trigger>> {
        self.by_event
            .get(event)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Dispatch order of two triggers for an event anchored at seat `start`.
///
/// Priority ascending, then system before player-bound, then seat distance
/// going forward from `start`, then registration order.
pub(crate) fn dispatch_order(a: &Trigger, b: &Trigger, start: Option<usize>) -> Ordering {
    a.priority
        .total_cmp(&b.priority)
        .then_with(|| seat_order(a.player.as_deref(), b.player.as_deref(), start))
        .then_with(|| a.id.cmp(&b.id))
}

fn seat_order(a: Option<&Player>, b: Option<&Player>, start: Option<usize>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => rotational_order(a.order(), b.order(), start),
    }
}

/// Compares two seats by how far forward of `start` they sit.
///
/// When `start` lies strictly between the two seats, the higher seat is
/// reached first going around the table, so the usual comparison flips.
fn rotational_order(o1: usize, o2: usize, start: Option<usize>) -> Ordering {
    if o1 == o2 {
        return Ordering::Equal;
    }
    if let Some(s) = start {
        if o1 == s {
            return Ordering::Less;
        }
        if o2 == s {
            return Ordering::Greater;
        }
        let straddles = (o1 < s && s < o2) || (o2 < s && s < o1);
        if straddles {
            return o2.cmp(&o1);
        }
    }
    o1.cmp(&o2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Invoker {
        Arc::new(|_, _| {})
    }

    #[test]
    fn test_add_without_events_returns_none() {
        let mut reg = TriggerRegistry::default();
        assert_eq!(reg.add(1.0, None, &[], noop()), None);
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let mut reg = TriggerRegistry::default();
        let a = reg.add(1.0, None, &["x"], noop()).unwrap();
        let b = reg.add(1.0, None, &["y"], noop()).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_add_indexes_every_event_name() {
        let mut reg = TriggerRegistry::default();
        let id = reg.add(0.0, None, &["a", "b", "a"], noop()).unwrap();
        assert_eq!(reg.collect("a").len(), 1);
        assert_eq!(reg.collect("b").len(), 1);
        assert_eq!(reg.collect("a")[0].id(), id);
        assert_eq!(reg.collect("a")[0].events(), ["a", "b"]);
    }

    #[test]
    fn test_remove_clears_both_indexes() {
        let mut reg = TriggerRegistry::default();
        let id = reg.add(0.0, None, &["a", "b"], noop()).unwrap();
        assert!(reg.remove(id));
        assert!(!reg.contains(id));
        assert!(reg.collect("a").is_empty());
        assert!(reg.collect("b").is_empty());
        assert!(!reg.remove(id), "second remove is a no-op");
    }

    #[test]
    fn test_rotational_order_without_anchor_is_ascending() {
        assert_eq!(rotational_order(0, 3, None), Ordering::Less);
        assert_eq!(rotational_order(3, 1, None), Ordering::Greater);
    }

    #[test]
    fn test_rotational_order_anchor_seat_first() {
        assert_eq!(rotational_order(2, 0, Some(2)), Ordering::Less);
        assert_eq!(rotational_order(0, 2, Some(2)), Ordering::Greater);
    }

    #[test]
    fn test_rotational_order_follows_table_from_anchor() {
        // Five seats anchored at 2: expected order is 2, 3, 4, 0, 1.
        let mut seats = vec![0usize, 1, 2, 3, 4];
        seats.sort_by(|a, b| rotational_order(*a, *b, Some(2)));
        assert_eq!(seats, vec![2, 3, 4, 0, 1]);
    }

    #[test]
    fn test_rotational_order_same_side_is_ascending() {
        assert_eq!(rotational_order(3, 4, Some(2)), Ordering::Less);
        assert_eq!(rotational_order(1, 0, Some(2)), Ordering::Greater);
    }
}
