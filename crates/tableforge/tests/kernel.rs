//! End-to-end tests: boot a kernel from plugins, form a room, play a game.

use std::sync::Arc;

use parking_lot::Mutex;
use tableforge::prelude::*;

// =========================================================================
// Plugins
// =========================================================================

/// A two-player game where each seat draws once per round for three
/// rounds; records which seat each turn belonged to.
fn cards_plugin(log: Arc<Mutex<Vec<String>>>) -> Plugin {
    Plugin::new("cards", 2)
        .description("shared card rules")
        .on_load(move |repo| {
            let _ = repo.build_mode(|b| {
                b.name("duel")
                    .description("two players, three rounds")
                    .players(2, 2)
                    .disable_random_order()
                    .initializer(move |ctx, _| {
                        let log = Arc::clone(&log);
                        ctx.add_trigger(0.0, None, &[names::TURN_STARTED], move |ctx, result| {
                            if result.stage() != Stage::Entering {
                                return;
                            }
                            if let Some(turn) = ctx.turn() {
                                log.lock().push(format!("{}:{}", turn.round(), turn.player().user()));
                            }
                        });
                        None
                    })
                    .turn_starter(|ctx, builder| {
                        let next = ctx.next_player(None)?;
                        let round = ctx.turn().map_or(1, |t| {
                            if next.order() == 0 { t.round() + 1 } else { t.round() }
                        });
                        if round > 3 {
                            return None;
                        }
                        builder.player(Some(next)).round(round);
                        None
                    })
            });
        })
}

fn members_plugin() -> Plugin {
    Plugin::new("members", 1)
        .depends_on("cards", 1)
        .on_load(|repo| {
            let _ = repo.build_mode(|b| {
                b.name("club")
                    .eligibility(|user| {
                        if user.as_str() == "guest" {
                            Err("members only".into())
                        } else {
                            Ok(())
                        }
                    })
                    .initializer(|_, _| None)
                    .turn_starter(|_, _| None)
            });
        })
}

fn registry(log: Arc<Mutex<Vec<String>>>) -> PluginRegistry {
    let mut plugins = PluginRegistry::new();
    plugins.add(members_plugin()).add(cards_plugin(log));
    plugins
}

// =========================================================================
// Boot
// =========================================================================

#[test]
fn test_boot_loads_plugins_in_dependency_order() {
    let kernel = Kernel::boot(KernelConfig::default(), registry(Arc::default())).unwrap();
    assert_eq!(
        kernel.load_layers(),
        &[vec!["cards".to_string()], vec!["members".to_string()]]
    );
    assert_eq!(kernel.plugins().len(), 2);
    assert!(kernel.warnings().is_empty());
    assert_eq!(kernel.modes().len(), 2);
}

#[test]
fn test_boot_version_mismatch_excludes_dependent() {
    let mut plugins = PluginRegistry::new();
    plugins
        .add(Plugin::new("A", 1).depends_on("B", 2))
        .add(Plugin::new("B", 1));
    let kernel = Kernel::boot(KernelConfig::default(), plugins).unwrap();

    assert_eq!(kernel.load_layers(), &[vec!["B".to_string()]]);
    assert!(matches!(
        kernel.warnings(),
        [RegistrationWarning::VersionMismatch { required: 2, found: 1, .. }]
    ));
}

#[test]
fn test_boot_strict_registration_is_fatal() {
    let mut plugins = PluginRegistry::new();
    plugins.add(Plugin::new("lonely", 1).depends_on("ghost", 1));
    let config = KernelConfig {
        strict_registration: true,
        ..Default::default()
    };

    let err = Kernel::boot(config, plugins).unwrap_err();
    let TableforgeError::Fatal(warnings) = err else {
        panic!("expected a fatal boot error");
    };
    assert_eq!(warnings.len(), 1);
}

#[test]
fn test_list_modes_filters_by_eligibility() {
    let kernel = Kernel::boot(KernelConfig::default(), registry(Arc::default())).unwrap();

    let listed = |user: &str| -> Vec<String> {
        kernel
            .list_modes(&UserId::new(user))
            .into_iter()
            .map(|m| m.name)
            .collect()
    };
    assert_eq!(listed("alice"), vec!["club", "duel"]);
    assert_eq!(listed("guest"), vec!["duel"]);
}

// =========================================================================
// Rooms
// =========================================================================

#[test]
fn test_room_lookup_after_disband_fails() {
    let kernel = Kernel::boot(KernelConfig::default(), registry(Arc::default())).unwrap();
    let alice = kernel.user("alice");
    let room = kernel.create_room(&alice, "club").unwrap();
    assert_eq!(kernel.list_rooms().len(), 1);

    kernel.leave_room(&alice).unwrap();
    let err = kernel.room(room.id()).unwrap_err();
    assert!(matches!(err, TableforgeError::Room(RoomError::RoomNotFound(_))));
    assert!(kernel.list_rooms().is_empty());
}

#[test]
fn test_duel_scenario_through_kernel() {
    let kernel = Kernel::boot(KernelConfig::default(), registry(Arc::default())).unwrap();
    let u1 = kernel.user("u1");
    let u2 = kernel.user("u2");
    let u3 = kernel.user("u3");

    let room = kernel.create_room(&u1, "duel").unwrap();
    assert_eq!(kernel.enter_room(&u2, room.id()).unwrap(), Seat::Player(1));
    assert_eq!(kernel.enter_room(&u3, room.id()).unwrap(), Seat::Spectator);

    kernel.leave_room(&u1).unwrap();
    assert!(room.is_owner(&u2));
    assert_eq!(u1.room(), None);
}

// =========================================================================
// Playing
// =========================================================================

#[tokio::test]
async fn test_full_game_runs_every_turn() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let kernel = Kernel::boot(KernelConfig::default(), registry(Arc::clone(&log))).unwrap();
    let alice = kernel.user("alice");
    let bob = kernel.user("bob");
    let room = kernel.create_room(&alice, "duel").unwrap();
    kernel.enter_room(&bob, room.id()).unwrap();

    let game = room.start().unwrap();
    let GameStatus::Finished(summary) = game.finished().await else {
        panic!("game did not finish");
    };
    assert_eq!(summary.turns, 6);
    assert_eq!(summary.last_round, 3);
    assert_eq!(
        *log.lock(),
        vec!["1:U-alice", "1:U-bob", "2:U-alice", "2:U-bob", "3:U-alice", "3:U-bob"]
    );
}

#[tokio::test]
async fn test_turn_cap_from_kernel_config() {
    let config = KernelConfig::from_json(r#"{"game_loop": {"max_turns": 4}}"#).unwrap();
    let kernel = Kernel::boot(config, registry(Arc::default())).unwrap();
    let alice = kernel.user("alice");
    let room = kernel.create_room(&alice, "duel").unwrap();
    kernel.enter_room(&kernel.user("bob"), room.id()).unwrap();

    let GameStatus::Finished(summary) = room.start().unwrap().finished().await else {
        panic!("game did not finish");
    };
    assert_eq!(summary.turns, 4);
    assert!(summary.capped);
}
