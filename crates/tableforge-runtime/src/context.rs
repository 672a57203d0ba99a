//! The per-game runtime context and event dispatch.

use std::any::Any;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;
use tableforge_protocol::{Item, TriggerId};
use tracing::{debug, trace, warn};

use crate::event::Stage;
use crate::trigger::{TriggerRegistry, dispatch_order};
use crate::{ConfigData, Data, DataCell, Event, InvokeResult, Invoker, Player, Snapshot, Turn};

/// How deep nested [`Context::invoke`] calls may go before dispatch is
/// refused.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 64;

/// State of one running game.
///
/// Created when a room starts a game and dropped when the game loop exits.
/// Shared between the loop and every trigger through [`Context`].
pub struct RuntimeContext {
    data: DataCell,
    room_config: ConfigData,
    config_view: Vec<Item>,
    players: Snapshot<Vec<Arc<Player>>>,
    turn: Snapshot<Option<Arc<Turn>>>,
    triggers: Mutex<TriggerRegistry>,
    max_dispatch_depth: usize,
}

impl RuntimeContext {
    /// Creates the context for a new game.
    ///
    /// `config_view` is the readonly render of the room's settings at the
    /// moment the game started.
    pub fn new(room_config: ConfigData, config_view: Vec<Item>, max_dispatch_depth: usize) -> Arc<Self> {
        Arc::new(Self {
            data: DataCell::default(),
            room_config,
            config_view,
            players: Snapshot::new(Vec::new()),
            turn: Snapshot::new(None),
            triggers: Mutex::new(TriggerRegistry::default()),
            max_dispatch_depth: max_dispatch_depth.max(1),
        })
    }

    // -- Bound data ------------------------------------------------------

    pub fn bind_data(&self, data: Data) {
        self.data.bind(data);
    }

    pub fn data<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.data.get_as::<T>()
    }

    pub fn raw_data(&self) -> Option<Data> {
        self.data.get()
    }

    pub fn room_config(&self) -> &ConfigData {
        &self.room_config
    }

    pub fn config_view(&self) -> &[Item] {
        &self.config_view
    }

    // -- Players and turn ------------------------------------------------

    /// The seated players, ordered by seat.
    pub fn players(&self) -> Arc<Vec<Arc<Player>>> {
        self.players.load()
    }

    pub fn publish_players(&self, players: Vec<Arc<Player>>) {
        self.players.store(players);
    }

    /// The current turn; `None` before the first turn.
    pub fn turn(&self) -> Option<Arc<Turn>> {
        (*self.turn.load()).clone()
    }

    pub fn publish_turn(&self, turn: Arc<Turn>) {
        self.turn.store(Some(turn));
    }

    /// The next alive player after `from`.
    ///
    /// Without `from` the current turn's player is the anchor; without a
    /// turn, iteration starts at the first seat. Returns `None` if nobody
    /// is alive. With a single alive player, that player is returned every
    /// time.
    pub fn next_player(&self, from: Option<&Player>) -> Option<Arc<Player>> {
        self.player_iter(from).next()
    }

    /// Every alive player, going once around the table starting just after
    /// the anchor (see [`next_player`](Self::next_player)).
    pub fn player_iter(&self, from: Option<&Player>) -> impl Iterator<Item = Arc<Player>> + use<> {
        let players = self.players();
        let n = players.len();
        let anchor = match from {
            Some(p) => Some(p.order()),
            None => self.turn().map(|t| t.player().order()),
        };
        let base = anchor
            .and_then(|order| players.iter().position(|p| p.order() == order))
            .unwrap_or(n.saturating_sub(1));
        (1..=n)
            .map(move |step| Arc::clone(&players[(base + step) % n]))
            .filter(|p| p.is_alive())
    }

    // -- Triggers --------------------------------------------------------

    /// Registers a trigger for `events`.
    ///
    /// Returns `None`, registering nothing, when `events` is empty.
    pub fn add_trigger(
        &self,
        priority: f64,
        player: Option<Arc<Player>>,
        events: &[&str],
        invoker: impl Fn(&Context, &mut InvokeResult) + Send + Sync + 'static,
    ) -> Option<TriggerId> {
        let invoker: Invoker = Arc::new(invoker);
        let seat = player.as_ref().map(|p| p.order());
        let id = self.triggers.lock().add(priority, player, events, invoker);
        if let Some(id) = id {
            trace!(%id, priority, ?seat, ?events, "trigger added");
        }
        id
    }

    /// Unregisters a trigger. Unknown ids are ignored.
    pub fn remove_trigger(&self, id: TriggerId) {
        if self.triggers.lock().remove(id) {
            trace!(%id, "trigger removed");
        }
    }

    pub fn has_trigger(&self, id: TriggerId) -> bool {
        self.triggers.lock().contains(id)
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.lock().len()
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Counts of one event delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub entered: usize,
    pub exited: usize,
}

/// An event-scoped view of a [`RuntimeContext`].
///
/// The root context has no event. Every delivery hands triggers a child
/// context carrying that event; invoking another event from inside a
/// trigger nests one level deeper.
#[derive(Clone)]
pub struct Context {
    runtime: Arc<RuntimeContext>,
    event: Option<Arc<Event>>,
    depth: usize,
}

impl Context {
    pub fn new(runtime: Arc<RuntimeContext>) -> Self {
        Self {
            runtime,
            event: None,
            depth: 0,
        }
    }

    pub fn runtime(&self) -> &Arc<RuntimeContext> {
        &self.runtime
    }

    /// The event being delivered; `None` at the root.
    pub fn event(&self) -> Option<&Event> {
        self.event.as_deref()
    }

    /// Nesting level; 0 at the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn with_event(&self, event: Arc<Event>) -> Context {
        Context {
            runtime: Arc::clone(&self.runtime),
            event: Some(event),
            depth: self.depth + 1,
        }
    }

    /// Delivers `event` to every matching trigger.
    ///
    /// Triggers whose player is dead are skipped. The rest are sorted (see
    /// the crate docs), invoked front to back with [`Stage::Entering`], then
    /// back to front with [`Stage::Exiting`]. A trigger removed by an
    /// earlier trigger in the same delivery is not entered.
    pub fn invoke(&self, event: Event) -> Dispatch {
        if self.depth >= self.runtime.max_dispatch_depth {
            warn!(
                event = event.name(),
                depth = self.depth,
                "dispatch depth limit reached, event dropped"
            );
            return Dispatch::default();
        }

        let mut triggers = self.runtime.triggers.lock().collect(event.name());
        triggers.retain(|t| t.is_eligible());
        if triggers.is_empty() {
            trace!(event = event.name(), "no triggers");
            return Dispatch::default();
        }

        let start = event
            .start_player()
            .map(|p| p.order())
            .or_else(|| self.runtime.turn().map(|t| t.player().order()));
        triggers.sort_by(|a, b| dispatch_order(a, b, start));

        debug!(
            event = event.name(),
            triggers = triggers.len(),
            ?start,
            depth = self.depth,
            "dispatching"
        );

        let ctx = self.with_event(Arc::new(event));
        let mut entered = Vec::with_capacity(triggers.len());
        for trigger in &triggers {
            if !self.runtime.has_trigger(trigger.id()) {
                continue;
            }
            let mut result = InvokeResult::new(Stage::Entering);
            trigger.call(&ctx, &mut result);
            entered.push(trigger);
            if result.is_fast_stopped() {
                trace!(id = %trigger.id(), "fast stop while entering");
                break;
            }
        }

        let mut exited = 0;
        for trigger in entered.iter().rev() {
            let mut result = InvokeResult::new(Stage::Exiting);
            trigger.call(&ctx, &mut result);
            exited += 1;
            if result.is_fast_stopped() {
                trace!(id = %trigger.id(), "fast stop while exiting");
                break;
            }
        }

        Dispatch {
            entered: entered.len(),
            exited,
        }
    }
}

impl Deref for Context {
    type Target = RuntimeContext;

    fn deref(&self) -> &RuntimeContext {
        &self.runtime
    }
}
