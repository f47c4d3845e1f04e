//! Live entity state reconstructed from the event stream.
//!
//! All positions are stored in centimetres. Workspaces keep their creation
//! order: touch coding scans them first-match-wins, so ordering is part of
//! the contract, not an implementation detail.

use std::collections::HashMap;

use trialscope_common::screen::euclidean;
use trialscope_trial_model::event::{EnemyType, TimestampMs};

/// An on-screen region assigned to one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub participant: String,
    pub x: f64,
    pub y: f64,
}

/// A participant's distance-interaction cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub participant: String,
    pub x: f64,
    pub y: f64,
    pub spawn_x: f64,
    pub spawn_y: f64,
    pub spawn_time_ms: TimestampMs,
    pub distance_travelled: f64,
}

impl Cursor {
    pub fn spawn(participant: String, x: f64, y: f64, time_ms: TimestampMs) -> Self {
        Self {
            participant,
            x,
            y,
            spawn_x: x,
            spawn_y: y,
            spawn_time_ms: time_ms,
            distance_travelled: 0.0,
        }
    }

    /// Straight-line distance from the spawn point to the current position.
    pub fn displacement(&self) -> f64 {
        euclidean(self.x - self.spawn_x, self.y - self.spawn_y)
    }
}

/// A scripted enemy currently alive on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: i64,
    pub enemy_type: EnemyType,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub spawn_x: f64,
    pub spawn_y: f64,
    pub spawn_time_ms: TimestampMs,
    pub distance_travelled: f64,
}

impl Enemy {
    pub fn spawn(
        id: i64,
        enemy_type: EnemyType,
        x: f64,
        y: f64,
        radius: f64,
        time_ms: TimestampMs,
    ) -> Self {
        Self {
            id,
            enemy_type,
            x,
            y,
            radius,
            spawn_x: x,
            spawn_y: y,
            spawn_time_ms: time_ms,
            distance_travelled: 0.0,
        }
    }
}

/// The live entities of one trial, owned exclusively by its replay pass.
#[derive(Debug, Default)]
pub struct EntityState {
    workspaces: Vec<Workspace>,
    cursors: HashMap<String, Cursor>,
    enemies: HashMap<i64, Enemy>,
}

impl EntityState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workspaces in creation order.
    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn workspace(&self, participant: &str) -> Option<&Workspace> {
        self.workspaces
            .iter()
            .find(|w| w.participant == participant)
    }

    /// Insert or replace a workspace. A replaced workspace keeps its position
    /// in the creation order.
    pub fn upsert_workspace(&mut self, workspace: Workspace) {
        match self
            .workspaces
            .iter_mut()
            .find(|w| w.participant == workspace.participant)
        {
            Some(existing) => *existing = workspace,
            None => self.workspaces.push(workspace),
        }
    }

    /// Update a workspace position. Returns false if the participant has no
    /// workspace yet.
    pub fn move_workspace(&mut self, participant: &str, x: f64, y: f64) -> bool {
        match self
            .workspaces
            .iter_mut()
            .find(|w| w.participant == participant)
        {
            Some(workspace) => {
                workspace.x = x;
                workspace.y = y;
                true
            }
            None => false,
        }
    }

    pub fn cursor(&self, participant: &str) -> Option<&Cursor> {
        self.cursors.get(participant)
    }

    /// Spawn a cursor. Fails if the participant already has one.
    pub fn spawn_cursor(&mut self, cursor: Cursor) -> Result<(), ()> {
        if self.cursors.contains_key(&cursor.participant) {
            return Err(());
        }
        self.cursors.insert(cursor.participant.clone(), cursor);
        Ok(())
    }

    /// Move a cursor, accumulating the Euclidean step distance. Returns false
    /// if no cursor is live for the participant.
    pub fn move_cursor(&mut self, participant: &str, x: f64, y: f64) -> bool {
        match self.cursors.get_mut(participant) {
            Some(cursor) => {
                cursor.distance_travelled += euclidean(cursor.x - x, cursor.y - y);
                cursor.x = x;
                cursor.y = y;
                true
            }
            None => false,
        }
    }

    /// Despawn a cursor. `None` if it was never live.
    pub fn despawn_cursor(&mut self, participant: &str) -> Option<Cursor> {
        self.cursors.remove(participant)
    }

    pub fn enemy(&self, id: i64) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    /// Spawn an enemy. Fails if the id is already live.
    pub fn spawn_enemy(&mut self, enemy: Enemy) -> Result<(), ()> {
        if self.enemies.contains_key(&enemy.id) {
            return Err(());
        }
        self.enemies.insert(enemy.id, enemy);
        Ok(())
    }

    /// Move an enemy, accumulating step distance. An unknown id is tolerated
    /// and ignored: the client removes enemies lazily at end of frame, so one
    /// trailing move arrives after every hit.
    pub fn move_enemy(&mut self, id: i64, x: f64, y: f64) {
        if let Some(enemy) = self.enemies.get_mut(&id) {
            enemy.distance_travelled += euclidean(enemy.x - x, enemy.y - y);
            enemy.x = x;
            enemy.y = y;
        }
    }

    /// Remove an enemy on hit or collision. `None` if the id is not live.
    pub fn remove_enemy(&mut self, id: i64) -> Option<Enemy> {
        self.enemies.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_duplicate_cursor_spawn_rejected() {
        let mut state = EntityState::new();
        state
            .spawn_cursor(Cursor::spawn("p1".into(), 1.0, 2.0, 100))
            .unwrap();
        assert!(state
            .spawn_cursor(Cursor::spawn("p1".into(), 5.0, 5.0, 200))
            .is_err());
    }

    #[test]
    fn test_cursor_respawn_starts_fresh_trajectory() {
        let mut state = EntityState::new();
        state
            .spawn_cursor(Cursor::spawn("p1".into(), 0.0, 0.0, 0))
            .unwrap();
        assert!(state.move_cursor("p1", 3.0, 4.0));
        assert!((state.cursor("p1").unwrap().distance_travelled - 5.0).abs() < 1e-12);
        state.despawn_cursor("p1").unwrap();

        state
            .spawn_cursor(Cursor::spawn("p1".into(), 10.0, 10.0, 500))
            .unwrap();
        let cursor = state.cursor("p1").unwrap();
        assert_eq!(cursor.distance_travelled, 0.0);
        assert_eq!(cursor.spawn_x, 10.0);
        assert_eq!(cursor.spawn_time_ms, 500);
    }

    #[test]
    fn test_enemy_move_after_removal_is_ignored() {
        let mut state = EntityState::new();
        state
            .spawn_enemy(Enemy::spawn(1, EnemyType::Cannon, 0.0, 0.0, 1.0, 0))
            .unwrap();
        state.remove_enemy(1).unwrap();
        // The client emits one trailing move per removed enemy.
        state.move_enemy(1, 50.0, 50.0);
        assert!(state.enemy(1).is_none());
    }

    #[test]
    fn test_workspace_upsert_keeps_creation_order() {
        let mut state = EntityState::new();
        state.upsert_workspace(Workspace {
            participant: "a".into(),
            x: 1.0,
            y: 1.0,
        });
        state.upsert_workspace(Workspace {
            participant: "b".into(),
            x: 2.0,
            y: 2.0,
        });
        state.upsert_workspace(Workspace {
            participant: "a".into(),
            x: 9.0,
            y: 9.0,
        });
        let order: Vec<&str> = state
            .workspaces()
            .iter()
            .map(|w| w.participant.as_str())
            .collect();
        assert_eq!(order, ["a", "b"]);
        assert_eq!(state.workspace("a").unwrap().x, 9.0);
    }

    proptest! {
        /// Distance travelled is the sum of per-step Euclidean deltas and
        /// never negative.
        #[test]
        fn prop_cursor_distance_accumulates(steps in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 0..40)) {
            let mut state = EntityState::new();
            state.spawn_cursor(Cursor::spawn("p".into(), 0.0, 0.0, 0)).unwrap();
            let mut expected = 0.0;
            let (mut px, mut py) = (0.0f64, 0.0f64);
            for (x, y) in steps {
                expected += euclidean(px - x, py - y);
                state.move_cursor("p", x, y);
                px = x;
                py = y;
            }
            let got = state.cursor("p").unwrap().distance_travelled;
            prop_assert!(got >= 0.0);
            prop_assert!((got - expected).abs() < 1e-9);
        }
    }
}
