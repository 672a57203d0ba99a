use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use tableforge::prelude::*;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Game types
// ---------------------------------------------------------------------------

struct Settings {
    health: i64,
}

/// Per-player state, bound to each seat by the initializer.
struct Fighter {
    health: AtomicI64,
}

/// Damage dealt by a strike in `round`: 1, 2, 3, 1, 2, 3, ...
fn damage(round: u32) -> i64 {
    i64::from(round.saturating_sub(1) % 3) + 1
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn duel_plugin() -> Plugin {
    Plugin::new("duel", 1)
        .description("two fighters trade blows until one falls")
        .on_load(|repo| {
            let registered = repo.build_mode(|b| {
                b.name("duel")
                    .description("first to zero health loses")
                    .players(2, 2)
                    .config(|| {
                        ConfigForm::new(ConfigData::new(Settings { health: 10 }))
                            .desc("Each strike deals 1 to 3 damage.")
                            .range(
                                RangeField::new("starting health")
                                    .min(5, "quick")
                                    .max(20, "long")
                                    .value(10)
                                    .on_change(|data, _, value| {
                                        data.write(|s: &mut Settings| s.health = value);
                                    }),
                            )
                    })
                    .initializer(initialize)
                    .turn_starter(start_turn)
            });
            if let Err(warning) = registered {
                warn!(%warning, "duel mode not registered");
            }
        })
}

fn initialize(ctx: &Context, participants: &mut [Participant]) -> Option<Data> {
    let health = ctx.room_config().read(|s: &Settings| s.health).unwrap_or(10);
    for participant in participants.iter_mut() {
        participant.bind_data(data(Fighter {
            health: AtomicI64::new(health),
        }));
    }

    ctx.add_trigger(0.0, None, &[names::PHASE_STARTED], |ctx, result| {
        if result.stage() != Stage::Entering {
            return;
        }
        let Some(turn) = ctx.turn() else { return };
        if turn.phase().is_none_or(|phase| phase.name() != "strike") {
            return;
        }
        let Some(target) = ctx.next_player(Some(turn.player().as_ref())) else { return };
        if target.user() == turn.player().user() {
            return;
        }
        let Some(fighter) = target.data::<Fighter>() else { return };
        let hit = damage(turn.round());
        let left = fighter.health.fetch_sub(hit, Ordering::SeqCst) - hit;
        info!(round = turn.round(), attacker = %turn.player().user(), target = %target.user(), hit, left, "strike");
        if left <= 0 {
            target.kill();
        }
    });

    ctx.add_trigger(0.0, None, &[names::GAME_FINISHED], |ctx, result| {
        if result.stage() != Stage::Exiting {
            return;
        }
        match ctx.player_iter(None).next() {
            Some(winner) => info!(winner = %winner.user(), "duel over"),
            None => info!("duel over, no one standing"),
        }
    });
    None
}

fn start_turn(ctx: &Context, builder: &mut TurnBuilder) -> Option<Data> {
    if ctx.player_iter(None).count() < 2 {
        return None;
    }
    builder.player(ctx.next_player(None));
    let mut phases = ["roll", "strike"].into_iter();
    builder.on_next_phase(move |_, phase| {
        if let Some(name) = phases.next() {
            phase.name(name);
        }
        None
    });
    None
}

/// Renders the owner's form and patches the health range. Returns how
/// many settings changed.
fn set_starting_health(room: &Room, owner: &Arc<User>, health: i64) -> Result<usize, RoomError> {
    let range_id = room
        .config_for(owner)
        .into_iter()
        .find(|item| item.range.is_some())
        .and_then(|item| item.id);
    match range_id {
        Some(id) => room.update_config(owner, &ConfigPatch::new().set(id, health)),
        None => Ok(0),
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), TableforgeError> {
    init_tracing();

    let mut plugins = PluginRegistry::new();
    plugins.add(duel_plugin());
    let kernel = Kernel::boot(KernelConfig::default(), plugins)?;

    let alice = kernel.user("alice");
    let bob = kernel.user("bob");
    let room = kernel.create_room(&alice, "duel")?;
    kernel.enter_room(&bob, room.id())?;

    let changed = set_starting_health(&room, &alice, 12)?;
    info!(changed, "starting health set");

    let game = room.start()?;
    match game.finished().await {
        GameStatus::Finished(summary) => {
            info!(turns = summary.turns, rounds = summary.last_round, "game finished");
        }
        other => warn!(status = ?other, "game ended abnormally"),
    }
    Ok(())
}
