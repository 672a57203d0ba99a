//! Integration tests for rooms and the room directory.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tableforge_mode::{ConfigForm, ModeBuilder, ModeRegistry, ModeRepository, RangeField};
use tableforge_protocol::{ConfigPatch, RoomId, UserId};
use tableforge_room::{ErrorKind, RoomDirectory, RoomError, RoomState, Seat};
use tableforge_runtime::ConfigData;
use tableforge_turn::{GameStatus, LoopConfig};

// =========================================================================
// Modes used by the tests
// =========================================================================

struct Settings {
    rounds: i64,
}

/// Every seated player takes one turn per round.
fn round_robin(b: ModeBuilder, rounds: impl Fn(&ConfigData) -> i64 + Send + Sync + 'static) -> ModeBuilder {
    b.disable_random_order()
        .initializer(|_, _| None)
        .turn_starter(move |ctx, builder| {
            let limit = u32::try_from(rounds(ctx.room_config())).unwrap_or(0);
            let next = ctx.next_player(None)?;
            let round = ctx.turn().map_or(1, |t| {
                if next.order() == 0 { t.round() + 1 } else { t.round() }
            });
            if round > limit {
                return None;
            }
            builder.player(Some(next)).round(round);
            None
        })
}

fn registry() -> Arc<ModeRegistry> {
    let mut repo = ModeRepository::new();
    repo.set_plugin("test");
    repo.build_mode(|b| round_robin(b.name("duel").players(2, 2), |_| 1))
        .unwrap();
    repo.build_mode(|b| round_robin(b.name("party").players(1, 4), |_| 1))
        .unwrap();
    repo.build_mode(|b| round_robin(b.name("solo").players(1, 1), |_| 1))
        .unwrap();
    repo.build_mode(|b| {
        round_robin(b.name("members").players(1, 4), |_| 1).eligibility(|user| {
            if user.as_str().starts_with("guest") {
                Err("guests may only watch".to_string())
            } else {
                Ok(())
            }
        })
    })
    .unwrap();
    repo.build_mode(|b| {
        round_robin(b.name("tuned").players(1, 4), |config| {
            config.read(|s: &Settings| s.rounds).unwrap_or(0)
        })
        .config(|| {
            ConfigForm::new(ConfigData::new(Settings { rounds: 3 })).range(
                RangeField::new("rounds")
                    .min(1, "short")
                    .max(5, "long")
                    .value(3)
                    .on_change(|data, _, value| {
                        data.write(|s: &mut Settings| s.rounds = value);
                    }),
            )
        })
    })
    .unwrap();
    repo.build_mode(|b| {
        b.name("slow")
            .players(1, 4)
            .initializer(|_, _| None)
            .turn_starter(|ctx, builder| {
                std::thread::sleep(Duration::from_millis(2));
                builder.player(ctx.next_player(None));
                None
            })
    })
    .unwrap();
    let (modes, warnings) = repo.into_parts();
    assert!(warnings.is_empty());
    Arc::new(modes)
}

fn directory() -> Arc<RoomDirectory> {
    RoomDirectory::new(registry(), LoopConfig::default())
}

// =========================================================================
// Creating and entering
// =========================================================================

#[test]
fn test_duel_room_full_then_owner_leaves() {
    let dir = directory();
    let u1 = dir.user("u1");
    let u2 = dir.user("u2");
    let u3 = dir.user("u3");

    let room = dir.create_room(&u1, "duel").unwrap();
    assert!(room.is_owner(&u1));
    assert_eq!(room.seat_of(u1.id()), Some(Seat::Player(0)));

    assert_eq!(room.enter(&u2).unwrap(), Seat::Player(1));
    assert_eq!(room.enter(&u3).unwrap(), Seat::Spectator);
    assert!(u3.is_spectator());

    room.leave(&u1).unwrap();
    assert!(room.is_owner(&u2));
    assert_eq!(u1.room(), None);
    assert_eq!(room.seat_of(u1.id()), None);
    assert!(!room.is_disbanded());
}

#[test]
fn test_create_room_assigns_increasing_ids_and_default_name() {
    let dir = directory();
    let a = dir.create_room(&dir.user("a"), "party").unwrap();
    let b = dir.create_room(&dir.user("b"), "party").unwrap();
    assert_eq!(a.id(), RoomId(1));
    assert_eq!(b.id(), RoomId(2));
    assert_eq!(a.name(), "room-1");

    a.rename("friday night");
    assert_eq!(a.name(), "friday night");
    assert_eq!(dir.len(), 2);
}

#[test]
fn test_create_room_unknown_mode_fails() {
    let dir = directory();
    let err = dir.create_room(&dir.user("a"), "chess").unwrap_err();
    assert_eq!(err, RoomError::ModeNotFound("chess".into()));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_create_room_ineligible_creator_fails() {
    let dir = directory();
    let err = dir.create_room(&dir.user("guest-1"), "members").unwrap_err();
    assert!(matches!(err, RoomError::NotEligible { .. }));
    assert!(dir.is_empty());
}

#[test]
fn test_create_room_while_in_room_fails() {
    let dir = directory();
    let user = dir.user("a");
    let room = dir.create_room(&user, "party").unwrap();
    let err = dir.create_room(&user, "party").unwrap_err();
    assert_eq!(err, RoomError::AlreadyInRoom(user.id().clone(), room.id()));
}

#[test]
fn test_user_lookup_returns_same_user() {
    let dir = directory();
    assert!(Arc::ptr_eq(&dir.user("a"), &dir.user("a")));
}

#[test]
fn test_forget_user_only_when_idle() {
    let dir = directory();
    dir.user("idle");
    let held = dir.user("held");
    let owner = dir.user("owner");
    dir.create_room(&owner, "party").unwrap();
    drop(owner);
    assert_eq!(dir.user_count(), 3);

    assert!(dir.forget_user(&UserId::new("idle")));
    assert!(!dir.forget_user(held.id()));
    assert!(!dir.forget_user(&UserId::new("owner")));
    assert!(!dir.forget_user(&UserId::new("nobody")));
    assert_eq!(dir.user_count(), 2);

    // A forgotten id comes back as a fresh user.
    let again = dir.user("idle");
    assert_eq!(again.room(), None);
    assert_eq!(dir.user_count(), 3);
}

#[test]
fn test_enter_same_room_twice_is_noop() {
    let dir = directory();
    let owner = dir.user("owner");
    let guest = dir.user("guest");
    let room = dir.create_room(&owner, "party").unwrap();

    assert_eq!(room.enter(&guest).unwrap(), Seat::Player(1));
    assert_eq!(room.enter(&guest).unwrap(), Seat::Player(1));
    assert_eq!(room.players().len(), 2);
}

#[test]
fn test_enter_other_room_fails() {
    let dir = directory();
    let first = dir.create_room(&dir.user("a"), "party").unwrap();
    let second = dir.create_room(&dir.user("b"), "party").unwrap();
    let c = dir.user("c");
    first.enter(&c).unwrap();

    let err = second.enter(&c).unwrap_err();
    assert_eq!(err, RoomError::AlreadyInRoom(c.id().clone(), first.id()));
}

#[test]
fn test_enter_ineligible_user_becomes_spectator() {
    let dir = directory();
    let room = dir.create_room(&dir.user("member"), "members").unwrap();
    let guest = dir.user("guest-7");

    assert_eq!(room.enter(&guest).unwrap(), Seat::Spectator);
    assert_eq!(room.players().len(), 1);
    assert_eq!(room.spectators().len(), 1);
}

#[test]
fn test_enter_fills_first_empty_slot() {
    let dir = directory();
    let room = dir.create_room(&dir.user("a"), "party").unwrap();
    let b = dir.user("b");
    let c = dir.user("c");
    let d = dir.user("d");
    room.enter(&b).unwrap();
    room.enter(&c).unwrap();
    room.leave(&b).unwrap();

    assert_eq!(room.enter(&d).unwrap(), Seat::Player(1));
}

#[test]
fn test_enter_room_unknown_id_fails() {
    let dir = directory();
    let err = dir.enter_room(&dir.user("a"), RoomId(99)).unwrap_err();
    assert_eq!(err, RoomError::RoomNotFound(RoomId(99)));
}

// =========================================================================
// Leaving
// =========================================================================

#[test]
fn test_leave_last_player_disbands_room() {
    let dir = directory();
    let owner = dir.user("owner");
    let watcher = dir.user("watcher");
    let room = dir.create_room(&owner, "solo").unwrap();
    assert_eq!(room.enter(&watcher).unwrap(), Seat::Spectator);

    dir.leave_room(&owner).unwrap();

    assert!(room.is_disbanded());
    assert_eq!(room.state(), RoomState::Disbanded);
    assert!(dir.get(room.id()).is_none());
    assert_eq!(room.owner().map(|u| u.id().clone()), None);
    assert_eq!(watcher.room(), None);
    assert!(!watcher.is_spectator());

    let late = dir.user("late");
    assert_eq!(room.enter(&late).unwrap_err(), RoomError::RoomNotFound(room.id()));
}

#[test]
fn test_leave_spectator_keeps_room() {
    let dir = directory();
    let owner = dir.user("owner");
    let watcher = dir.user("watcher");
    let room = dir.create_room(&owner, "solo").unwrap();
    room.enter(&watcher).unwrap();

    room.leave(&watcher).unwrap();
    assert!(room.spectators().is_empty());
    assert!(room.is_owner(&owner));
    assert_eq!(watcher.room(), None);
}

#[test]
fn test_leave_owner_transfers_to_lowest_slot() {
    let dir = directory();
    let a = dir.user("a");
    let b = dir.user("b");
    let c = dir.user("c");
    let room = dir.create_room(&a, "party").unwrap();
    room.enter(&b).unwrap();
    room.enter(&c).unwrap();
    room.leave(&b).unwrap();
    assert!(room.is_owner(&a));

    room.leave(&a).unwrap();
    assert!(room.is_owner(&c));
}

#[test]
fn test_leave_without_room_fails() {
    let dir = directory();
    let room = dir.create_room(&dir.user("a"), "party").unwrap();
    let stranger = dir.user("stranger");

    let err = room.leave(&stranger).unwrap_err();
    assert_eq!(err, RoomError::NotInAnyRoom(stranger.id().clone()));
    assert_eq!(err.kind(), ErrorKind::State);
}

#[test]
fn test_leave_wrong_room_fails() {
    let dir = directory();
    let first = dir.create_room(&dir.user("a"), "party").unwrap();
    let b = dir.user("b");
    let second = dir.create_room(&b, "party").unwrap();

    let err = first.leave(&b).unwrap_err();
    assert_eq!(
        err,
        RoomError::InOtherRoom {
            user: b.id().clone(),
            current: second.id(),
            target: first.id(),
        }
    );
}

// =========================================================================
// Mode changes
// =========================================================================

#[test]
fn test_set_mode_by_non_owner_fails() {
    let dir = directory();
    let room = dir.create_room(&dir.user("a"), "party").unwrap();
    let b = dir.user("b");
    room.enter(&b).unwrap();

    let err = room.set_mode(&b, "duel").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(room.mode().name(), "party");
}

#[test]
fn test_set_mode_unknown_fails() {
    let dir = directory();
    let a = dir.user("a");
    let room = dir.create_room(&a, "party").unwrap();
    assert_eq!(
        room.set_mode(&a, "chess").unwrap_err(),
        RoomError::ModeNotFound("chess".into())
    );
}

#[test]
fn test_set_mode_grow_keeps_slots() {
    let dir = directory();
    let a = dir.user("a");
    let b = dir.user("b");
    let room = dir.create_room(&a, "duel").unwrap();
    room.enter(&b).unwrap();

    room.set_mode(&a, "party").unwrap();
    assert_eq!(room.capacity(), 4);
    assert_eq!(room.seat_of(a.id()), Some(Seat::Player(0)));
    assert_eq!(room.seat_of(b.id()), Some(Seat::Player(1)));
}

#[test]
fn test_set_mode_shrink_compacts_and_demotes() {
    let dir = directory();
    let a = dir.user("a");
    let users: Vec<_> = ["b", "c", "d"].iter().map(|id| dir.user(*id)).collect();
    let room = dir.create_room(&a, "party").unwrap();
    for u in &users {
        room.enter(u).unwrap();
    }
    room.leave(&users[0]).unwrap();

    room.set_mode(&a, "duel").unwrap();
    assert_eq!(room.capacity(), 2);
    assert_eq!(room.seat_of(a.id()), Some(Seat::Player(0)));
    assert_eq!(room.seat_of(users[1].id()), Some(Seat::Player(1)));
    assert_eq!(room.seat_of(users[2].id()), Some(Seat::Spectator));
    assert!(users[2].is_spectator());
    assert_eq!(users[2].room(), Some(room.id()));
}

#[test]
fn test_set_mode_shrink_keeps_owner_seated() {
    let dir = directory();
    let a = dir.user("a");
    let b = dir.user("b");
    let c = dir.user("c");
    let room = dir.create_room(&a, "party").unwrap();
    room.enter(&b).unwrap();
    room.enter(&c).unwrap();
    // c inherits ownership only after a and b have left slots 0 and 1;
    // re-entering puts them back in front of c.
    room.leave(&a).unwrap();
    room.leave(&b).unwrap();
    room.enter(&a).unwrap();
    room.enter(&b).unwrap();
    assert!(room.is_owner(&c));
    assert_eq!(room.seat_of(c.id()), Some(Seat::Player(2)));

    room.set_mode(&c, "solo").unwrap();
    assert_eq!(room.seat_of(c.id()), Some(Seat::Player(0)));
    assert_eq!(room.seat_of(a.id()), Some(Seat::Spectator));
    assert_eq!(room.seat_of(b.id()), Some(Seat::Spectator));
}

#[test]
fn test_set_mode_same_name_keeps_config() {
    let dir = directory();
    let a = dir.user("a");
    let room = dir.create_room(&a, "tuned").unwrap();
    let id = room.config_for(&a)[0].id.clone().unwrap();
    room.update_config(&a, &ConfigPatch::new().set(id, 5)).unwrap();

    room.set_mode(&a, "tuned").unwrap();
    let range = room.config_for(&a)[0].range.clone().unwrap();
    assert_eq!(range.value, 5);
}

// =========================================================================
// Configuration
// =========================================================================

#[test]
fn test_config_for_non_owner_is_readonly() {
    let dir = directory();
    let a = dir.user("a");
    let b = dir.user("b");
    let room = dir.create_room(&a, "tuned").unwrap();
    room.enter(&b).unwrap();

    assert!(room.config_for(&a).iter().all(|item| item.is_addressable()));
    assert!(room.config_for(&b).iter().all(|item| !item.is_addressable()));
}

#[test]
fn test_update_config_changes_value() {
    let dir = directory();
    let a = dir.user("a");
    let b = dir.user("b");
    let room = dir.create_room(&a, "tuned").unwrap();
    room.enter(&b).unwrap();

    let id = room.config_for(&a)[0].id.clone().unwrap();
    let changed = room.update_config(&a, &ConfigPatch::new().set(id, 4)).unwrap();
    assert_eq!(changed, 1);

    let view = room.config_for(&b);
    assert_eq!(view[0].range.as_ref().map(|r| r.value), Some(4));
}

#[test]
fn test_update_config_before_owner_render_is_ignored() {
    let dir = directory();
    let a = dir.user("a");
    let room = dir.create_room(&a, "tuned").unwrap();
    let changed = room
        .update_config(&a, &ConfigPatch::new().set("0", 4))
        .unwrap();
    assert_eq!(changed, 0);
}

#[test]
fn test_update_config_by_non_owner_fails() {
    let dir = directory();
    let a = dir.user("a");
    let b = dir.user("b");
    let room = dir.create_room(&a, "tuned").unwrap();
    room.enter(&b).unwrap();
    let err = room.update_config(&b, &ConfigPatch::new()).unwrap_err();
    assert_eq!(err, RoomError::NotOwner(b.id().clone(), room.id()));
}

#[test]
fn test_reset_config_restores_defaults() {
    let dir = directory();
    let a = dir.user("a");
    let room = dir.create_room(&a, "tuned").unwrap();
    let id = room.config_for(&a)[0].id.clone().unwrap();
    room.update_config(&a, &ConfigPatch::new().set(id, 1)).unwrap();

    room.reset_config(&a).unwrap();
    let range = room.config_for(&a)[0].range.clone().unwrap();
    assert_eq!(range.value, 3);
}

// =========================================================================
// Starting games
// =========================================================================

#[test]
fn test_start_without_enough_players_fails() {
    let dir = directory();
    let room = dir.create_room(&dir.user("a"), "duel").unwrap();
    let err = room.start().unwrap_err();
    assert_eq!(
        err,
        RoomError::NotEnoughPlayers {
            room: room.id(),
            required: 2,
            present: 1,
        }
    );
}

#[test]
fn test_start_outside_runtime_fails() {
    let dir = directory();
    let room = dir.create_room(&dir.user("a"), "solo").unwrap();
    assert_eq!(room.start().unwrap_err(), RoomError::NoRuntime);
    assert_eq!(room.state(), RoomState::Forming);
}

#[tokio::test]
async fn test_start_runs_game_to_completion() {
    let dir = directory();
    let a = dir.user("a");
    let room = dir.create_room(&a, "duel").unwrap();
    room.enter(&dir.user("b")).unwrap();
    dir.enter_room(&dir.user("c"), room.id()).unwrap();

    let handle = room.start().unwrap();
    let GameStatus::Finished(summary) = handle.finished().await else {
        panic!("game did not finish");
    };
    // Spectators do not play.
    assert_eq!(summary.turns, 2);
    assert_eq!(handle.runtime().players().len(), 2);
    assert_eq!(room.state(), RoomState::Forming);
}

#[tokio::test]
async fn test_start_uses_updated_config() {
    let dir = directory();
    let a = dir.user("a");
    let room = dir.create_room(&a, "tuned").unwrap();
    let id = room.config_for(&a)[0].id.clone().unwrap();
    room.update_config(&a, &ConfigPatch::new().set(id, 5)).unwrap();

    let handle = room.start().unwrap();
    let GameStatus::Finished(summary) = handle.finished().await else {
        panic!("game did not finish");
    };
    assert_eq!(summary.last_round, 5);
    assert_eq!(handle.runtime().config_view()[0].range.as_ref().map(|r| r.value), Some(5));
    assert!(!handle.runtime().config_view()[0].is_addressable());
}

#[tokio::test]
async fn test_start_again_after_finish() {
    let dir = directory();
    let room = dir.create_room(&dir.user("a"), "solo").unwrap();

    let first = room.start().unwrap();
    assert!(!first.finished().await.is_running());
    let second = room.start().unwrap();
    assert!(matches!(second.finished().await, GameStatus::Finished(_)));
}

#[tokio::test]
async fn test_running_game_blocks_changes() {
    let dir = directory();
    let a = dir.user("a");
    let room = dir.create_room(&a, "slow").unwrap();

    let handle = room.start().unwrap();
    assert_eq!(room.state(), RoomState::Running);
    assert_eq!(room.start().unwrap_err(), RoomError::GameRunning(room.id()));
    assert_eq!(room.set_mode(&a, "party").unwrap_err(), RoomError::GameRunning(room.id()));
    assert_eq!(
        room.update_config(&a, &ConfigPatch::new()).unwrap_err(),
        RoomError::GameRunning(room.id())
    );
    assert_eq!(room.reset_config(&a).unwrap_err(), RoomError::GameRunning(room.id()));

    handle.cancel();
    assert_eq!(handle.finished().await, GameStatus::Cancelled);
    assert!(room.start().is_ok());
    room.game().unwrap().cancel();
}

#[tokio::test]
async fn test_disband_cancels_running_game() {
    let dir = directory();
    let a = dir.user("a");
    let room = dir.create_room(&a, "slow").unwrap();
    let handle = room.start().unwrap();

    room.leave(&a).unwrap();
    assert_eq!(handle.finished().await, GameStatus::Cancelled);
    assert!(room.game().is_none());
}

// =========================================================================
// Concurrency
// =========================================================================

#[test]
fn test_concurrent_enter_never_overfills() {
    let dir = directory();
    let room = dir.create_room(&dir.user("owner"), "party").unwrap();
    let seated = Arc::new(AtomicUsize::new(0));

    let threads: Vec<_> = (0..16)
        .map(|i| {
            let dir = Arc::clone(&dir);
            let room_id = room.id();
            let seated = Arc::clone(&seated);
            std::thread::spawn(move || {
                let user = dir.user(format!("u{i}"));
                if let Seat::Player(_) = dir.enter_room(&user, room_id).unwrap() {
                    seated.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(seated.load(Ordering::SeqCst), 3);
    assert_eq!(room.players().len(), 4);
    assert_eq!(room.spectators().len(), 13);
}

#[test]
fn test_list_reports_rooms_by_id() {
    let dir = directory();
    let a = dir.create_room(&dir.user("a"), "duel").unwrap();
    dir.create_room(&dir.user("b"), "party").unwrap();

    let infos = dir.list();
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].id, a.id());
    assert_eq!(infos[0].mode, "duel");
    assert_eq!(infos[0].players.len(), 2);
    assert_eq!(infos[1].mode, "party");
}
