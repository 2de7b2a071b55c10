//! Turn rotation and round progression.
//!
//! Every operation here is a no-op returning `None`/`false` unless the room
//! is [`RoomState::Playing`], so a late message can never revive a
//! finished game.

use fairway_course::Point;
use fairway_protocol::PlayerId;

use crate::{Room, RoomState};

/// What happened when a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The round continues with `turn_id`.
    ChangeTurn { turn_id: PlayerId },

    /// Everyone was done; `round` has been laid out and `turn_id` tees off.
    NextRound { round: u32, turn_id: PlayerId },

    /// The last round is over and the room is finished.
    GameOver { winners: Vec<PlayerId> },
}

impl Room {
    /// The per-round shot limit, if the shot-budget rule is on.
    pub fn shot_limit(&self) -> Option<u32> {
        if !self.rules.shot_budget {
            return None;
        }
        self.layout.as_ref().map(|l| l.par)
    }

    fn is_done(&self, index: usize) -> bool {
        let limit = self.shot_limit();
        self.players.get(index).is_none_or(|p| p.is_done(limit))
    }

    /// Moves the turn to the next player who is not done, scanning forward
    /// from the current one. If everyone is done the turn stays where it is.
    ///
    /// Returns the new turn index.
    pub fn advance_turn(&mut self) -> usize {
        let n = self.players.len();
        if n == 0 {
            return 0;
        }
        if let Some(next) = (1..=n)
            .map(|step| (self.turn_index + step) % n)
            .find(|&i| !self.is_done(i))
        {
            self.turn_index = next;
        }
        self.turn_seq += 1;
        self.turn_index
    }

    /// Every player has holed out or run out of shots.
    pub fn is_round_complete(&self) -> bool {
        (0..self.players.len()).all(|i| self.is_done(i))
    }

    /// Counts a shot for the active player. Returns `false` if `id` may not
    /// shoot right now, including when the shot budget is used up.
    pub fn record_shot(&mut self, id: PlayerId) -> bool {
        if !self.is_active(id) {
            return false;
        }
        let limit = self.shot_limit();
        match self.player_mut(id) {
            Some(player) if !player.is_done(limit) => {
                player.shots += 1;
                true
            }
            _ => false,
        }
    }

    /// Marks the active player as holed out and scores the hole.
    ///
    /// Returns `true` only the first time in a round. A ball sunk by the
    /// last shot of the budget still counts.
    pub fn record_finish(&mut self, id: PlayerId) -> bool {
        if !self.is_active(id) {
            return false;
        }
        let Some(player) = self.player_mut(id) else {
            return false;
        };
        if player.finished {
            return false;
        }
        player.finished = true;
        player.score += 1;
        true
    }

    /// Records where the active player's ball stopped and ends their turn.
    pub fn complete_turn(&mut self, id: PlayerId, position: Point) -> Option<TurnOutcome> {
        if !self.is_active(id) {
            return None;
        }
        if let Some(player) = self.player_mut(id) {
            player.position = position;
        }
        Some(self.end_turn())
    }

    /// Ends the current turn without touching the player, as long as
    /// `turn_seq` still identifies it.
    pub fn forfeit_turn(&mut self, turn_seq: u64) -> Option<TurnOutcome> {
        if !self.state.is_playing() || turn_seq != self.turn_seq {
            return None;
        }
        Some(self.end_turn())
    }

    fn end_turn(&mut self) -> TurnOutcome {
        let turn_index = self.advance_turn();
        if self.is_round_complete() {
            return self.advance_round();
        }
        TurnOutcome::ChangeTurn {
            turn_id: self.players[turn_index].id,
        }
    }

    fn advance_round(&mut self) -> TurnOutcome {
        let next = self.round() + 1;
        if self.rules.max_rounds.is_some_and(|max| next > max) {
            self.state = RoomState::Finished;
            self.turn_seq += 1;
            let winners = self.winners();
            tracing::info!(
                room_code = %self.code,
                rounds = next - 1,
                winners = ?winners,
                "game over"
            );
            return TurnOutcome::GameOver { winners };
        }

        self.begin_round(next);
        tracing::info!(room_code = %self.code, round = next, "round advanced");
        TurnOutcome::NextRound {
            round: next,
            turn_id: self.players[self.turn_index].id,
        }
    }

    /// Players sharing the highest score.
    pub fn winners(&self) -> Vec<PlayerId> {
        let Some(best) = self.players.iter().map(|p| p.score).max() else {
            return Vec::new();
        };
        self.players
            .iter()
            .filter(|p| p.score == best)
            .map(|p| p.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use fairway_protocol::RoomCode;

    use super::*;
    use crate::GameConfig;
    use crate::room::RoomRules;

    fn playing_room(n: u64, config: &GameConfig) -> Room {
        let code = RoomCode::parse("TURN01").unwrap();
        let mut room = Room::new(code, n as usize, RoomRules::from(config));
        for id in 1..=n {
            room.add_player(PlayerId(id), format!("p{id}")).unwrap();
        }
        assert!(room.state().is_playing());
        room
    }

    #[test]
    fn test_advance_turn_full_rotation_returns_to_start() {
        for n in 1..=4 {
            let mut room = playing_room(n, &GameConfig::default());
            for _ in 0..n {
                room.advance_turn();
            }
            assert_eq!(room.turn_index(), 0, "n = {n}");
        }
    }

    #[test]
    fn test_advance_turn_lands_on_sole_unfinished_player() {
        for sole in 0..4 {
            for start in 0..4 {
                let mut room = playing_room(4, &GameConfig::default());
                for (i, p) in room.players.iter_mut().enumerate() {
                    p.finished = i != sole;
                }
                room.turn_index = start;
                assert_eq!(room.advance_turn(), sole, "sole {sole} start {start}");
            }
        }
    }

    #[test]
    fn test_advance_turn_bumps_seq() {
        let mut room = playing_room(2, &GameConfig::default());
        let before = room.turn_seq();
        room.advance_turn();
        assert_eq!(room.turn_seq(), before + 1);
    }

    #[test]
    fn test_double_finish_scores_once() {
        let mut room = playing_room(2, &GameConfig::default());
        assert!(room.record_finish(PlayerId(1)));
        assert!(!room.record_finish(PlayerId(1)));
        assert_eq!(room.player(PlayerId(1)).unwrap().score, 1);
    }

    #[test]
    fn test_inactive_player_cannot_act() {
        let mut room = playing_room(2, &GameConfig::default());
        assert!(!room.record_shot(PlayerId(2)));
        assert!(!room.record_finish(PlayerId(2)));
        assert!(room.complete_turn(PlayerId(2), Point::new(1.0, 1.0)).is_none());
        assert_eq!(room.turn_index(), 0);
    }

    #[test]
    fn test_complete_turn_records_position_and_passes_turn() {
        let mut room = playing_room(2, &GameConfig::default());
        let outcome = room.complete_turn(PlayerId(1), Point::new(150.0, 300.0));
        assert_eq!(outcome, Some(TurnOutcome::ChangeTurn { turn_id: PlayerId(2) }));
        assert_eq!(room.player(PlayerId(1)).unwrap().position, Point::new(150.0, 300.0));
    }

    #[test]
    fn test_forfeit_skips_without_scoring() {
        let mut room = playing_room(2, &GameConfig::default());
        let seq = room.turn_seq();
        let outcome = room.forfeit_turn(seq);
        assert_eq!(outcome, Some(TurnOutcome::ChangeTurn { turn_id: PlayerId(2) }));
        let p1 = room.player(PlayerId(1)).unwrap();
        assert!(!p1.finished);
        assert_eq!(p1.score, 0);

        // The timer armed for player 1's turn is now stale.
        assert!(room.forfeit_turn(seq).is_none());
        assert_eq!(room.turn_index(), 1);
    }

    #[test]
    fn test_last_finish_advances_round() {
        let mut room = playing_room(2, &GameConfig::default());
        room.record_finish(PlayerId(1));
        room.complete_turn(PlayerId(1), Point::new(200.0, 80.0));
        room.record_finish(PlayerId(2));
        let outcome = room.complete_turn(PlayerId(2), Point::new(200.0, 80.0));

        assert_eq!(
            outcome,
            Some(TurnOutcome::NextRound { round: 2, turn_id: PlayerId(1) })
        );
        assert_eq!(room.round(), 2);
        assert!(room.players().iter().all(|p| !p.finished && p.shots == 0));
        assert!(room.players().iter().all(|p| p.score == 1));
    }

    #[test]
    fn test_max_rounds_ends_game() {
        let config = GameConfig { max_rounds: Some(1), ..GameConfig::default() };
        let mut room = playing_room(2, &config);
        room.record_finish(PlayerId(1));
        room.complete_turn(PlayerId(1), Point::new(200.0, 80.0));
        let outcome = room.forfeit_turn(room.turn_seq());

        // Player 1 is finished, so the forfeit hands the turn straight back.
        assert_eq!(outcome, Some(TurnOutcome::ChangeTurn { turn_id: PlayerId(2) }));

        room.record_finish(PlayerId(2));
        let outcome = room.complete_turn(PlayerId(2), Point::new(200.0, 80.0));
        assert_eq!(
            outcome,
            Some(TurnOutcome::GameOver { winners: vec![PlayerId(1), PlayerId(2)] })
        );
        assert_eq!(room.state(), RoomState::Finished);
        assert!(room.active_player().is_none());
        assert!(room.forfeit_turn(room.turn_seq()).is_none());
    }

    #[test]
    fn test_shot_budget_counts_player_out() {
        let config = GameConfig { shot_budget: true, ..GameConfig::default() };
        let mut room = playing_room(2, &config);
        let par = room.shot_limit().unwrap();
        for _ in 0..par {
            assert!(room.record_shot(PlayerId(1)));
        }
        room.complete_turn(PlayerId(1), Point::new(100.0, 400.0));
        assert_eq!(room.active_player().unwrap().id, PlayerId(2));

        // Player 1 is out of shots, so the turn comes straight back.
        let outcome = room.complete_turn(PlayerId(2), Point::new(100.0, 400.0));
        assert_eq!(outcome, Some(TurnOutcome::ChangeTurn { turn_id: PlayerId(2) }));
        assert_eq!(room.player(PlayerId(1)).unwrap().score, 0);
    }

    #[test]
    fn test_shot_budget_refuses_extra_shots() {
        let config = GameConfig { shot_budget: true, ..GameConfig::default() };
        let mut room = playing_room(2, &config);
        let par = room.shot_limit().unwrap();
        let accepted = (0..par + 5).filter(|_| room.record_shot(PlayerId(1))).count();
        assert_eq!(accepted, par as usize);
        assert_eq!(room.player(PlayerId(1)).unwrap().shots, par);

        // The last permitted shot may still drop.
        assert!(room.record_finish(PlayerId(1)));
        assert_eq!(room.player(PlayerId(1)).unwrap().score, 1);
    }

    #[test]
    fn test_unlimited_shots_without_budget() {
        let mut room = playing_room(2, &GameConfig::default());
        assert!(room.shot_limit().is_none());
        for _ in 0..20 {
            assert!(room.record_shot(PlayerId(1)));
        }
        assert_eq!(room.player(PlayerId(1)).unwrap().shots, 20);
    }

    #[test]
    fn test_winners_allow_ties() {
        let mut room = playing_room(3, &GameConfig::default());
        room.players[0].score = 2;
        room.players[1].score = 3;
        room.players[2].score = 3;
        assert_eq!(room.winners(), vec![PlayerId(2), PlayerId(3)]);
    }
}
