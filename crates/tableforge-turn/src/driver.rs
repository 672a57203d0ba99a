//! The game loop itself.

use std::any::Any;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tableforge_mode::ModeDefinition;
use tableforge_protocol::{Item, RoomId, UserId};
use tableforge_runtime::{
    ConfigData, Context, Event, Participant, Phase, PhaseBuilder, Player, RuntimeContext, Turn,
    TurnBuilder, names,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn};

use crate::{GameHandle, GameStatus, GameSummary, LoopConfig, LoopError};

/// Drives one game from seating to the last turn.
pub struct GameLoop {
    mode: Arc<ModeDefinition>,
    users: Vec<UserId>,
    runtime: Arc<RuntimeContext>,
    config: LoopConfig,
}

impl GameLoop {
    /// Prepares a game of `mode` for `users`, in seat order.
    ///
    /// `room_config` is the room's settings data; `config_view` its
    /// readonly render at start time.
    pub fn new(
        mode: Arc<ModeDefinition>,
        users: Vec<UserId>,
        room_config: ConfigData,
        config_view: Vec<Item>,
        config: LoopConfig,
    ) -> Self {
        let config = config.validated();
        let runtime = RuntimeContext::new(room_config, config_view, config.max_dispatch_depth);
        Self {
            mode,
            users,
            runtime,
            config,
        }
    }

    pub fn runtime(&self) -> &Arc<RuntimeContext> {
        &self.runtime
    }

    /// Runs the game on the calling thread until it ends.
    ///
    /// Returns [`LoopError::Cancelled`] if `cancel` fires first. A panic in
    /// a rule callback propagates.
    pub fn run(self, cancel: &CancellationToken) -> Result<GameSummary, LoopError> {
        let ctx = Context::new(Arc::clone(&self.runtime));

        let players = self.seat(&ctx);
        debug!(players = players.len(), "players seated");
        for player in &players {
            ctx.invoke(Event::new(names::PLAYER_PREPARED).from_player(Arc::clone(player)));
        }
        ensure_running(cancel)?;
        ctx.invoke(Event::new(names::GAME_STARTED));

        let mut summary = GameSummary::default();
        loop {
            ensure_running(cancel)?;
            if summary.turns >= self.config.max_turns {
                warn!(cap = self.config.max_turns, "turn cap reached, ending game");
                summary.capped = true;
                break;
            }

            let mut builder = TurnBuilder::new();
            let turn_data = self.mode.start_turn(&ctx, &mut builder);
            let plan = builder.into_plan();
            let Some(player) = plan.player else {
                break;
            };

            let round = plan
                .round
                .unwrap_or_else(|| summary.last_round.saturating_add(1));
            let turn = Arc::new(Turn::new(round, player, turn_data));
            self.runtime.publish_turn(Arc::clone(&turn));
            summary.turns += 1;
            summary.last_round = round;
            debug!(round, seat = turn.player().order(), user = %turn.player().user(), "turn started");
            ctx.invoke(Event::new(names::TURN_STARTED));

            let Some(mut next_phase) = plan.phases else {
                continue;
            };
            let mut phases = 0;
            loop {
                ensure_running(cancel)?;
                if phases >= self.config.max_phases_per_turn {
                    warn!(
                        round,
                        cap = self.config.max_phases_per_turn,
                        "phase cap reached, ending turn"
                    );
                    summary.capped = true;
                    break;
                }
                let mut builder = PhaseBuilder::new();
                let phase_data = next_phase(&ctx, &mut builder);
                let name = builder.into_name();
                if name.is_empty() {
                    break;
                }
                turn.set_phase(Arc::new(Phase::new(name, phase_data)));
                phases += 1;
                summary.phases += 1;
                ctx.invoke(Event::new(names::PHASE_STARTED).from_player(Arc::clone(turn.player())));
            }
        }

        ctx.invoke(Event::new(names::GAME_FINISHED));
        Ok(summary)
    }

    /// Shuffles, runs the initializer, and publishes the players.
    fn seat(&self, ctx: &Context) -> Vec<Arc<Player>> {
        let mut participants: Vec<Participant> = self
            .users
            .iter()
            .map(|user| Participant::new(user.clone(), 0))
            .collect();
        if self.mode.random_order() {
            match self.config.seed {
                Some(seed) => participants.shuffle(&mut StdRng::seed_from_u64(seed)),
                None => participants.shuffle(&mut rand::rng()),
            }
        }
        for (order, participant) in participants.iter_mut().enumerate() {
            participant.order = order;
        }

        if let Some(data) = self.mode.initialize(ctx, &mut participants) {
            self.runtime.bind_data(data);
        }

        // The initializer may have rewritten orders; renumber them 0..N.
        participants.sort_by_key(|p| p.order);
        let players: Vec<Arc<Player>> = participants
            .into_iter()
            .enumerate()
            .map(|(order, p)| Arc::new(Player::new(p.user, order, p.data)))
            .collect();
        self.runtime.publish_players(players.clone());
        players
    }

    /// Runs the game on Tokio's blocking pool under a supervisor task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(self, room: RoomId) -> Result<GameHandle, LoopError> {
        let tokio = tokio::runtime::Handle::try_current().map_err(|_| LoopError::NoRuntime)?;
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(GameStatus::Running);
        let runtime = Arc::clone(&self.runtime);

        let span = info_span!("game", room = %room, mode = self.mode.name());
        let token = cancel.clone();
        let worker = tokio.spawn_blocking(move || {
            let _entered = span.enter();
            info!(players = self.users.len(), "game started");
            self.run(&token)
        });

        tokio.spawn(async move {
            let status = match worker.await {
                Ok(Ok(summary)) => {
                    info!(%room, turns = summary.turns, rounds = summary.last_round, "game finished");
                    GameStatus::Finished(summary)
                }
                Ok(Err(LoopError::Cancelled)) => {
                    info!(%room, "game cancelled");
                    GameStatus::Cancelled
                }
                Ok(Err(e)) => GameStatus::Failed(e.to_string()),
                Err(e) if e.is_panic() => {
                    let err = LoopError::Panicked(panic_message(e.into_panic()));
                    warn!(%room, error = %err, "game failed");
                    GameStatus::Failed(err.to_string())
                }
                Err(e) => {
                    let err = LoopError::Aborted(e.to_string());
                    warn!(%room, error = %err, "game failed");
                    GameStatus::Failed(err.to_string())
                }
            };
            tx.send_replace(status);
        });

        Ok(GameHandle::new(room, rx, cancel, runtime))
    }
}

fn ensure_running(cancel: &CancellationToken) -> Result<(), LoopError> {
    if cancel.is_cancelled() {
        Err(LoopError::Cancelled)
    } else {
        Ok(())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
