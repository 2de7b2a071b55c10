//! Event relay: turns one client message into room mutations and the
//! messages they cause.
//!
//! The relay never touches a socket. [`dispatch`] and [`expire_turn`] run
//! against the registry while the caller holds its lock and return a list
//! of [`Effect`]s; the server applies them in order.

use std::time::Duration;

use fairway_course::Point;
use fairway_protocol::{
    Channel, ClientMessage, PlayerId, ProtocolError, Recipient, RoomCode,
    ServerMessage,
};
use fairway_room::{GameConfig, Room, RoomRegistry, TurnOutcome};

use crate::FairwayError;

/// A message bound for a resolved list of players.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: Vec<PlayerId>,
    pub channel: Channel,
    pub message: ServerMessage,
}

impl Delivery {
    /// A reliable message to one player.
    pub fn to_player(player_id: PlayerId, message: ServerMessage) -> Self {
        Self {
            to: vec![player_id],
            channel: Channel::ReliableOrdered,
            message,
        }
    }

    /// A message to everyone `recipient` selects in `room`.
    pub fn to_room(
        room: &Room,
        recipient: Recipient,
        channel: Channel,
        message: ServerMessage,
    ) -> Self {
        Self {
            to: room.recipients(recipient),
            channel,
            message,
        }
    }
}

/// Something the server must do after a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Queue now, before the registry lock is released.
    Deliver(Delivery),

    /// Queue after `delay`. Used for the pause between rounds.
    DeliverAfter { delay: Duration, delivery: Delivery },

    /// Call [`expire_turn`] for this room after `after`.
    ArmTurnTimer {
        room_code: RoomCode,
        turn_seq: u64,
        after: Duration,
    },
}

/// Handles one message from `sender`.
///
/// Requests that fail validation produce a single `error` reply to the
/// sender. Turn actions from anyone but the active player, or aimed at a
/// room that does not exist, produce nothing.
pub fn dispatch(
    registry: &mut RoomRegistry,
    sender: PlayerId,
    msg: ClientMessage,
) -> Vec<Effect> {
    let result = match msg {
        ClientMessage::CreateRoom { capacity } => create_room(registry, sender, capacity),
        ClientMessage::JoinRoom { room_code, name } => {
            join_room(registry, sender, &room_code, &name)
        }
        ClientMessage::Shoot { room_code, vx, vy } => {
            shoot(registry, sender, &room_code, vx, vy)
        }
        ClientMessage::TurnComplete { room_code, x, y } => {
            turn_complete(registry, sender, &room_code, x, y)
        }
        ClientMessage::HoleIn { room_code } => hole_in(registry, sender, &room_code),
        ClientMessage::SyncPosition { room_code, x, y } => {
            sync_position(registry, sender, &room_code, x, y)
        }
        // Answered by the connection handler without taking the lock.
        ClientMessage::Heartbeat { .. } => Ok(Vec::new()),
    };

    result.unwrap_or_else(|e| {
        tracing::debug!(player_id = %sender, error = %e, "request rejected");
        vec![Effect::Deliver(Delivery::to_player(
            sender,
            ServerMessage::Error {
                code: e.status_code(),
                message: e.to_string(),
            },
        ))]
    })
}

/// Fires when a turn timer elapses. Skips the turn if `turn_seq` still
/// identifies the current one.
pub fn expire_turn(
    registry: &mut RoomRegistry,
    room_code: &RoomCode,
    turn_seq: u64,
) -> Vec<Effect> {
    let config = registry.config().clone();
    let Some(room) = registry.room_mut(room_code) else {
        return Vec::new();
    };
    let idle = room.active_player().map(|p| p.id);
    let Some(outcome) = room.forfeit_turn(turn_seq) else {
        return Vec::new();
    };
    if let Some(player_id) = idle {
        tracing::warn!(%room_code, %player_id, "turn timed out, skipping player");
    }
    turn_effects(room, outcome, &config)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn create_room(
    registry: &mut RoomRegistry,
    sender: PlayerId,
    capacity: u32,
) -> Result<Vec<Effect>, FairwayError> {
    let capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
    let room_code = registry.create_room(capacity)?;
    Ok(vec![Effect::Deliver(Delivery::to_player(
        sender,
        ServerMessage::RoomCreated { room_code },
    ))])
}

fn join_room(
    registry: &mut RoomRegistry,
    sender: PlayerId,
    room_code: &RoomCode,
    name: &str,
) -> Result<Vec<Effect>, FairwayError> {
    let outcome = registry.join_room(room_code, sender, name)?;
    let config = registry.config().clone();
    let Some(room) = registry.room(room_code) else {
        return Ok(Vec::new());
    };

    let mut effects = vec![broadcast(
        room,
        ServerMessage::UpdateLobby {
            room_code: room_code.clone(),
            capacity: room.capacity(),
            players: room.views(),
        },
    )];

    if outcome.started {
        if let (Some(layout), Some(active)) = (room.layout(), room.active_player()) {
            effects.push(broadcast(
                room,
                ServerMessage::GameStart {
                    map: layout.clone(),
                    players: room.views(),
                    turn_id: active.id,
                },
            ));
        }
        effects.extend(turn_timer(room, &config, Duration::ZERO));
    }
    Ok(effects)
}

fn shoot(
    registry: &mut RoomRegistry,
    sender: PlayerId,
    room_code: &RoomCode,
    vx: f32,
    vy: f32,
) -> Result<Vec<Effect>, FairwayError> {
    require_finite("velocity", vx, vy)?;
    let Some(room) = active_room(registry, room_code, sender, "shoot") else {
        return Ok(Vec::new());
    };
    if !room.record_shot(sender) {
        tracing::debug!(%room_code, player_id = %sender, "shot budget used up, dropping");
        return Ok(Vec::new());
    }
    Ok(vec![broadcast(
        room,
        ServerMessage::PlayerShot { id: sender, vx, vy },
    )])
}

fn turn_complete(
    registry: &mut RoomRegistry,
    sender: PlayerId,
    room_code: &RoomCode,
    x: f32,
    y: f32,
) -> Result<Vec<Effect>, FairwayError> {
    require_finite("position", x, y)?;
    let config = registry.config().clone();
    let Some(room) = active_room(registry, room_code, sender, "turn_complete") else {
        return Ok(Vec::new());
    };
    let Some(outcome) = room.complete_turn(sender, Point::new(x, y)) else {
        return Ok(Vec::new());
    };
    Ok(turn_effects(room, outcome, &config))
}

fn hole_in(
    registry: &mut RoomRegistry,
    sender: PlayerId,
    room_code: &RoomCode,
) -> Result<Vec<Effect>, FairwayError> {
    let Some(room) = active_room(registry, room_code, sender, "hole_in") else {
        return Ok(Vec::new());
    };
    if !room.record_finish(sender) {
        tracing::debug!(%room_code, player_id = %sender, "repeated hole_in ignored");
        return Ok(Vec::new());
    }
    let Some(player) = room.player(sender) else {
        return Ok(Vec::new());
    };
    tracing::info!(%room_code, player_id = %sender, score = player.score, "player holed out");
    let notice = ServerMessage::FinishedNotice {
        id: sender,
        name: player.name.clone(),
        message: format!("{} finished!", player.name),
    };
    Ok(vec![broadcast(room, notice)])
}

fn sync_position(
    registry: &mut RoomRegistry,
    sender: PlayerId,
    room_code: &RoomCode,
    x: f32,
    y: f32,
) -> Result<Vec<Effect>, FairwayError> {
    require_finite("position", x, y)?;
    let Some(room) = active_room(registry, room_code, sender, "sync_position") else {
        return Ok(Vec::new());
    };
    Ok(vec![Effect::Deliver(Delivery::to_room(
        room,
        Recipient::AllExcept(sender),
        Channel::Unreliable,
        ServerMessage::PositionSync { id: sender, x, y },
    ))])
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The room `sender` may act in right now, or `None` with a debug log.
fn active_room<'a>(
    registry: &'a mut RoomRegistry,
    room_code: &RoomCode,
    sender: PlayerId,
    action: &'static str,
) -> Option<&'a mut Room> {
    let Some(room) = registry.room_mut(room_code) else {
        tracing::debug!(%room_code, player_id = %sender, action, "unknown room, dropping");
        return None;
    };
    if !room.is_active(sender) {
        tracing::debug!(
            %room_code,
            player_id = %sender,
            action,
            state = %room.state(),
            "not this player's turn, dropping"
        );
        return None;
    }
    Some(room)
}

fn require_finite(what: &str, a: f32, b: f32) -> Result<(), ProtocolError> {
    if a.is_finite() && b.is_finite() {
        Ok(())
    } else {
        Err(ProtocolError::InvalidMessage(format!(
            "{what} must be finite, got ({a}, {b})"
        )))
    }
}

fn broadcast(room: &Room, message: ServerMessage) -> Effect {
    Effect::Deliver(Delivery::to_room(
        room,
        Recipient::All,
        Channel::ReliableOrdered,
        message,
    ))
}

/// Arms the timer for the turn that just began, `extra` after the usual
/// timeout.
fn turn_timer(room: &Room, config: &GameConfig, extra: Duration) -> Option<Effect> {
    let timeout = config.turn_timeout?;
    Some(Effect::ArmTurnTimer {
        room_code: room.code().clone(),
        turn_seq: room.turn_seq(),
        after: timeout + extra,
    })
}

/// Messages and timers that follow the end of a turn.
fn turn_effects(room: &Room, outcome: TurnOutcome, config: &GameConfig) -> Vec<Effect> {
    match outcome {
        TurnOutcome::ChangeTurn { turn_id } => {
            let mut effects = vec![broadcast(
                room,
                ServerMessage::ChangeTurn {
                    turn_id,
                    players: room.views(),
                },
            )];
            effects.extend(turn_timer(room, config, Duration::ZERO));
            effects
        }
        TurnOutcome::NextRound { turn_id, .. } => {
            let Some(layout) = room.layout() else {
                return Vec::new();
            };
            let delivery = Delivery::to_room(
                room,
                Recipient::All,
                Channel::ReliableOrdered,
                ServerMessage::NextRound {
                    map: layout.clone(),
                    players: room.views(),
                    turn_id,
                },
            );
            let mut effects = vec![Effect::DeliverAfter {
                delay: config.round_advance_delay,
                delivery,
            }];
            effects.extend(turn_timer(room, config, config.round_advance_delay));
            effects
        }
        TurnOutcome::GameOver { winners } => vec![broadcast(
            room,
            ServerMessage::GameOver {
                players: room.views(),
                winners,
            },
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    fn registry() -> RoomRegistry {
        RoomRegistry::new(GameConfig {
            turn_timeout: Some(Duration::from_secs(60)),
            round_advance_delay: Duration::from_secs(3),
            ..GameConfig::default()
        })
    }

    fn messages(effects: &[Effect]) -> Vec<&ServerMessage> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Deliver(d) => Some(&d.message),
                Effect::DeliverAfter { delivery, .. } => Some(&delivery.message),
                Effect::ArmTurnTimer { .. } => None,
            })
            .collect()
    }

    fn created_code(effects: &[Effect]) -> RoomCode {
        match messages(effects).as_slice() {
            [ServerMessage::RoomCreated { room_code }] => room_code.clone(),
            other => panic!("expected room_created, got {other:?}"),
        }
    }

    fn started_room(registry: &mut RoomRegistry) -> RoomCode {
        let code = created_code(&dispatch(registry, pid(1), ClientMessage::CreateRoom { capacity: 2 }));
        for (id, name) in [(1, "Ada"), (2, "Bo")] {
            dispatch(
                registry,
                pid(id),
                ClientMessage::JoinRoom { room_code: code.clone(), name: name.into() },
            );
        }
        code
    }

    fn error_code(effects: &[Effect]) -> Option<u16> {
        match effects {
            [Effect::Deliver(Delivery { message: ServerMessage::Error { code, .. }, .. })] => {
                Some(*code)
            }
            _ => None,
        }
    }

    #[test]
    fn test_create_room_replies_to_sender_only() {
        let mut registry = registry();
        let effects = dispatch(&mut registry, pid(7), ClientMessage::CreateRoom { capacity: 3 });
        let [Effect::Deliver(delivery)] = effects.as_slice() else {
            panic!("expected one delivery, got {effects:?}");
        };
        assert_eq!(delivery.to, vec![pid(7)]);
        assert!(matches!(delivery.message, ServerMessage::RoomCreated { .. }));
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn test_bad_capacity_is_400() {
        let mut registry = registry();
        let effects = dispatch(&mut registry, pid(1), ClientMessage::CreateRoom { capacity: 0 });
        assert_eq!(error_code(&effects), Some(400));
        let effects = dispatch(&mut registry, pid(1), ClientMessage::CreateRoom { capacity: 99 });
        assert_eq!(error_code(&effects), Some(400));
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn test_join_unknown_room_is_404() {
        let mut registry = registry();
        let effects = dispatch(
            &mut registry,
            pid(1),
            ClientMessage::JoinRoom {
                room_code: RoomCode::parse("ZZZZZZ").unwrap(),
                name: "Ada".into(),
            },
        );
        assert_eq!(error_code(&effects), Some(404));
    }

    #[test]
    fn test_join_full_room_is_409_to_requester_only() {
        let mut registry = registry();
        let code = started_room(&mut registry);
        let effects = dispatch(
            &mut registry,
            pid(3),
            ClientMessage::JoinRoom { room_code: code, name: "Cy".into() },
        );
        assert_eq!(error_code(&effects), Some(409));
        let Effect::Deliver(delivery) = &effects[0] else { unreachable!() };
        assert_eq!(delivery.to, vec![pid(3)]);
    }

    #[test]
    fn test_join_broadcasts_lobby_then_game_start() {
        let mut registry = registry();
        let code = created_code(&dispatch(&mut registry, pid(1), ClientMessage::CreateRoom { capacity: 2 }));

        let first = dispatch(
            &mut registry,
            pid(1),
            ClientMessage::JoinRoom { room_code: code.clone(), name: "Ada".into() },
        );
        assert!(matches!(
            messages(&first).as_slice(),
            [ServerMessage::UpdateLobby { players, capacity: 2, .. }] if players.len() == 1
        ));

        let second = dispatch(
            &mut registry,
            pid(2),
            ClientMessage::JoinRoom { room_code: code.clone(), name: "Bo".into() },
        );
        assert_eq!(second.len(), 3);
        let Effect::Deliver(lobby) = &second[0] else { panic!() };
        assert_eq!(lobby.to, vec![pid(1), pid(2)]);
        assert!(matches!(lobby.message, ServerMessage::UpdateLobby { .. }));
        let Effect::Deliver(start) = &second[1] else { panic!() };
        let ServerMessage::GameStart { map, players, turn_id } = &start.message else {
            panic!("expected game_start, got {:?}", start.message);
        };
        assert_eq!(*turn_id, pid(1));
        assert_eq!(map.round, 1);
        assert!(players.iter().all(|p| p.x == map.start.x && p.y == map.start.y));
        assert!(matches!(
            &second[2],
            Effect::ArmTurnTimer { after, .. } if *after == Duration::from_secs(60)
        ));
    }

    #[test]
    fn test_out_of_turn_actions_are_dropped() {
        let mut registry = registry();
        let code = started_room(&mut registry);

        for msg in [
            ClientMessage::Shoot { room_code: code.clone(), vx: 1.0, vy: 1.0 },
            ClientMessage::TurnComplete { room_code: code.clone(), x: 1.0, y: 1.0 },
            ClientMessage::HoleIn { room_code: code.clone() },
            ClientMessage::SyncPosition { room_code: code.clone(), x: 1.0, y: 1.0 },
        ] {
            assert!(dispatch(&mut registry, pid(2), msg).is_empty());
        }
        let room = registry.room(&code).unwrap();
        assert_eq!(room.active_player().unwrap().id, pid(1));
        assert_eq!(room.player(pid(2)).unwrap().score, 0);
    }

    #[test]
    fn test_unknown_room_gameplay_is_dropped() {
        let mut registry = registry();
        let effects = dispatch(
            &mut registry,
            pid(1),
            ClientMessage::HoleIn { room_code: RoomCode::parse("NOROOM").unwrap() },
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn test_non_finite_input_is_400() {
        let mut registry = registry();
        let code = started_room(&mut registry);
        let effects = dispatch(
            &mut registry,
            pid(1),
            ClientMessage::Shoot { room_code: code.clone(), vx: f32::NAN, vy: 0.0 },
        );
        assert_eq!(error_code(&effects), Some(400));
        assert_eq!(registry.room(&code).unwrap().player(pid(1)).unwrap().shots, 0);
    }

    #[test]
    fn test_shoot_counts_and_broadcasts() {
        let mut registry = registry();
        let code = started_room(&mut registry);
        let effects = dispatch(
            &mut registry,
            pid(1),
            ClientMessage::Shoot { room_code: code.clone(), vx: 3.5, vy: -7.0 },
        );
        let [Effect::Deliver(delivery)] = effects.as_slice() else { panic!() };
        assert_eq!(delivery.to, vec![pid(1), pid(2)]);
        assert_eq!(
            delivery.message,
            ServerMessage::PlayerShot { id: pid(1), vx: 3.5, vy: -7.0 }
        );
        assert_eq!(registry.room(&code).unwrap().player(pid(1)).unwrap().shots, 1);
    }

    #[test]
    fn test_shots_past_budget_are_dropped() {
        let mut registry = RoomRegistry::new(GameConfig {
            shot_budget: true,
            ..GameConfig::default()
        });
        let code = started_room(&mut registry);
        let par = registry.room(&code).unwrap().shot_limit().unwrap();

        let shoot = || ClientMessage::Shoot { room_code: code.clone(), vx: 1.0, vy: 1.0 };
        for _ in 0..par {
            assert_eq!(dispatch(&mut registry, pid(1), shoot()).len(), 1);
        }
        assert!(dispatch(&mut registry, pid(1), shoot()).is_empty());
        assert_eq!(registry.room(&code).unwrap().player(pid(1)).unwrap().shots, par);
    }

    #[test]
    fn test_sync_position_skips_sender_and_is_unreliable() {
        let mut registry = registry();
        let code = started_room(&mut registry);
        let effects = dispatch(
            &mut registry,
            pid(1),
            ClientMessage::SyncPosition { room_code: code.clone(), x: 10.0, y: 20.0 },
        );
        let [Effect::Deliver(delivery)] = effects.as_slice() else { panic!() };
        assert_eq!(delivery.to, vec![pid(2)]);
        assert_eq!(delivery.channel, Channel::Unreliable);
        assert_eq!(
            delivery.message,
            ServerMessage::PositionSync { id: pid(1), x: 10.0, y: 20.0 }
        );
    }

    #[test]
    fn test_two_player_scenario() {
        let mut registry = registry();
        let code = started_room(&mut registry);

        // P1 stops short: change_turn to P2.
        let effects = dispatch(
            &mut registry,
            pid(1),
            ClientMessage::TurnComplete { room_code: code.clone(), x: 200.0, y: 400.0 },
        );
        assert!(matches!(
            messages(&effects).as_slice(),
            [ServerMessage::ChangeTurn { turn_id, .. }] if *turn_id == pid(2)
        ));

        // P2 holes out: finished notice, then change_turn back to P1.
        let effects = dispatch(&mut registry, pid(2), ClientMessage::HoleIn { room_code: code.clone() });
        assert!(matches!(
            messages(&effects).as_slice(),
            [ServerMessage::FinishedNotice { message, .. }] if message == "Bo finished!"
        ));
        let repeat = dispatch(&mut registry, pid(2), ClientMessage::HoleIn { room_code: code.clone() });
        assert!(repeat.is_empty());

        let effects = dispatch(
            &mut registry,
            pid(2),
            ClientMessage::TurnComplete { room_code: code.clone(), x: 200.0, y: 80.0 },
        );
        let msgs = messages(&effects);
        let [ServerMessage::ChangeTurn { turn_id, players }] = msgs.as_slice() else {
            panic!("expected change_turn, got {effects:?}");
        };
        assert_eq!(*turn_id, pid(1));
        assert_eq!((players[0].x, players[0].y), (200.0, 400.0));
        assert!(players[1].finished);
        assert_eq!(players[1].score, 1);

        // P1 holes out: round 2 after the delay, turn back to P1.
        dispatch(&mut registry, pid(1), ClientMessage::HoleIn { room_code: code.clone() });
        let effects = dispatch(
            &mut registry,
            pid(1),
            ClientMessage::TurnComplete { room_code: code.clone(), x: 200.0, y: 80.0 },
        );
        let [
            Effect::DeliverAfter { delay, delivery },
            Effect::ArmTurnTimer { after, .. },
        ] = effects.as_slice()
        else {
            panic!("expected delayed next_round, got {effects:?}");
        };
        assert_eq!(*delay, Duration::from_secs(3));
        assert_eq!(*after, Duration::from_secs(63));
        let ServerMessage::NextRound { map, players, turn_id } = &delivery.message else {
            panic!("expected next_round");
        };
        assert_eq!(map.round, 2);
        assert_eq!(*turn_id, pid(1));
        for p in players {
            assert_eq!((p.x, p.y), (map.start.x, map.start.y));
            assert!(!p.finished);
            assert_eq!(p.score, 1);
        }
    }

    #[test]
    fn test_game_over_is_terminal() {
        let mut registry = RoomRegistry::new(GameConfig {
            max_rounds: Some(1),
            ..GameConfig::default()
        });
        let code = started_room(&mut registry);
        for id in [1, 2] {
            dispatch(&mut registry, pid(id), ClientMessage::HoleIn { room_code: code.clone() });
            let effects = dispatch(
                &mut registry,
                pid(id),
                ClientMessage::TurnComplete { room_code: code.clone(), x: 200.0, y: 80.0 },
            );
            if id == 2 {
                assert!(matches!(
                    messages(&effects).as_slice(),
                    [ServerMessage::GameOver { winners, .. }] if winners.len() == 2
                ));
                assert!(!effects.iter().any(|e| matches!(e, Effect::ArmTurnTimer { .. })));
            }
        }

        for id in [1, 2] {
            let effects = dispatch(
                &mut registry,
                pid(id),
                ClientMessage::Shoot { room_code: code.clone(), vx: 1.0, vy: 1.0 },
            );
            assert!(effects.is_empty());
        }
    }

    #[test]
    fn test_expire_turn_skips_and_rearms() {
        let mut registry = registry();
        let code = started_room(&mut registry);
        let seq = registry.room(&code).unwrap().turn_seq();

        let effects = expire_turn(&mut registry, &code, seq);
        assert!(matches!(
            messages(&effects).as_slice(),
            [ServerMessage::ChangeTurn { turn_id, .. }] if *turn_id == pid(2)
        ));
        let new_seq = registry.room(&code).unwrap().turn_seq();
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::ArmTurnTimer { turn_seq, .. } if *turn_seq == new_seq
        )));

        // Stale timer.
        assert!(expire_turn(&mut registry, &code, seq).is_empty());
        let p1 = registry.room(&code).unwrap().player(pid(1)).unwrap();
        assert!(!p1.finished);
        assert_eq!(p1.score, 0);
    }

    #[test]
    fn test_no_timer_when_disabled() {
        let mut registry = RoomRegistry::new(GameConfig {
            turn_timeout: None,
            ..GameConfig::default()
        });
        let code = started_room(&mut registry);
        let effects = dispatch(
            &mut registry,
            pid(1),
            ClientMessage::TurnComplete { room_code: code, x: 1.0, y: 1.0 },
        );
        assert_eq!(effects.len(), 1);
    }
}
