//! Typed output rows and their CSV rendering.
//!
//! One row type per output mode, with the column order fixed by the
//! downstream analysis scripts. Rows render themselves to CSV lines; none of
//! the field values can contain a comma, so no quoting is needed.

use std::fmt::Write as _;

use trialscope_trial_model::event::{EnemyType, TimestampMs};

/// Column header for kill-data output.
pub const KILL_DATA_HEADER: &[&str] = &[
    "RowIndex",
    "TrialIndex",
    "EnemyId",
    "EnemyType",
    "EnemyScriptType",
    "EnemyX_cm",
    "EnemyY_cm",
    "EnemyLiveTime_ms",
    "EnemyDistanceTravelled_cm",
    "BlockIndex",
    "WaveIndex",
    "WithinWaveIndex",
    "ParticipantIdKilled",
    "RealParticipantIdKilled",
    "ParticipantOnSameSideIndicator",
    "UsedCursorIndicator",
    "CursorMoveDistanceTravelled_cm",
    "CursorMoveDisplacement_cm",
    "EnemyDistanceFromWorkspaceCentre_cm",
    "EnemyDistanceFromCursorSpawn_cm",
    "CannonBlastId",
    "BlackHoleEncircleId",
    "CooperativeIndicator",
];

/// Column header for touch-data output.
pub const TOUCH_DATA_HEADER: &[&str] = &[
    "RowIndex",
    "TrialIndex",
    "ParticipantId",
    "RealParticipantId",
    "TouchX_cm",
    "TouchY_cm",
    "Heat_ms",
    "RelativeModeIndicator",
    "CooperativeModeIndicator",
];

/// How a killed enemy relates to the wave's script assignment for the side
/// of the screen it died on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptRole {
    /// The type the script assigned to that side.
    Main,
    /// The other side's type, killed across the seam.
    Sub,
    /// The minority third type.
    Flank,
}

impl std::fmt::Display for ScriptRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ScriptRole::Main => "Main",
            ScriptRole::Sub => "Sub",
            ScriptRole::Flank => "Flank",
        })
    }
}

/// One emitted kill event.
#[derive(Debug, Clone)]
pub struct KillRow {
    pub row_index: i64,
    pub trial_index: usize,
    pub enemy_id: i64,
    pub enemy_type: EnemyType,
    pub script_role: ScriptRole,
    pub enemy_x_cm: f64,
    pub enemy_y_cm: f64,
    pub live_time_ms: TimestampMs,
    pub distance_travelled_cm: f64,
    pub block_index: i64,
    pub wave_index: i64,
    pub within_wave_index: i64,
    pub participant_id: i64,
    pub real_participant_id: String,
    pub same_side: bool,
    pub used_cursor: bool,
    pub cursor_distance_travelled_cm: f64,
    pub cursor_displacement_cm: f64,
    pub distance_from_workspace_cm: f64,
    pub distance_from_cursor_spawn_cm: f64,
    pub cannon_blast_id: i64,
    pub black_hole_encircle_id: i64,
    pub cooperative: bool,
}

impl KillRow {
    /// Render the row in `KILL_DATA_HEADER` column order.
    pub fn to_csv_line(&self) -> String {
        let mut line = String::new();
        let _ = write!(
            line,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            self.row_index,
            self.trial_index,
            self.enemy_id,
            self.enemy_type,
            self.script_role,
            self.enemy_x_cm,
            self.enemy_y_cm,
            self.live_time_ms,
            self.distance_travelled_cm,
            self.block_index,
            self.wave_index,
            self.within_wave_index,
            self.participant_id,
            self.real_participant_id,
            self.same_side as u8,
            self.used_cursor as u8,
            self.cursor_distance_travelled_cm,
            self.cursor_displacement_cm,
            self.distance_from_workspace_cm,
            self.distance_from_cursor_spawn_cm,
            self.cannon_blast_id,
            self.black_hole_encircle_id,
            self.cooperative as u8,
        );
        line
    }
}

/// One emitted touch-move event.
#[derive(Debug, Clone)]
pub struct TouchRow {
    pub row_index: i64,
    pub trial_index: usize,
    pub participant_id: i64,
    /// Raw participant key the occurrence was coded to; empty when uncoded.
    pub real_participant_id: Option<String>,
    pub touch_x_cm: f64,
    pub touch_y_cm: f64,
    pub heat_ms: TimestampMs,
    pub relative_mode: bool,
    pub cooperative: bool,
}

impl TouchRow {
    /// Render the row in `TOUCH_DATA_HEADER` column order.
    pub fn to_csv_line(&self) -> String {
        let mut line = String::new();
        let _ = write!(
            line,
            "{},{},{},{},{},{},{},{},{}",
            self.row_index,
            self.trial_index,
            self.participant_id,
            self.real_participant_id.as_deref().unwrap_or(""),
            self.touch_x_cm,
            self.touch_y_cm,
            self.heat_ms,
            self.relative_mode as u8,
            self.cooperative as u8,
        );
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_header_has_column_per_field() {
        assert_eq!(KILL_DATA_HEADER.len(), 23);
        assert_eq!(KILL_DATA_HEADER[0], "RowIndex");
        assert_eq!(KILL_DATA_HEADER[22], "CooperativeIndicator");
    }

    #[test]
    fn test_kill_row_renders_in_header_order() {
        let row = KillRow {
            row_index: 0,
            trial_index: 0,
            enemy_id: 1,
            enemy_type: EnemyType::Cannon,
            script_role: ScriptRole::Main,
            enemy_x_cm: 5.5,
            enemy_y_cm: 6.25,
            live_time_ms: 1000,
            distance_travelled_cm: 0.5,
            block_index: 0,
            wave_index: 0,
            within_wave_index: 0,
            participant_id: 0,
            real_participant_id: "p1".to_string(),
            same_side: true,
            used_cursor: false,
            cursor_distance_travelled_cm: 0.0,
            cursor_displacement_cm: 0.0,
            distance_from_workspace_cm: 12.0,
            distance_from_cursor_spawn_cm: 0.0,
            cannon_blast_id: 0,
            black_hole_encircle_id: 0,
            cooperative: false,
        };
        let line = row.to_csv_line();
        assert_eq!(line.split(',').count(), KILL_DATA_HEADER.len());
        assert!(line.starts_with("0,0,1,Enemy.Cannon,Main,5.5,6.25,1000,0.5,"));
        assert!(line.ends_with(",0,0,0"));
    }

    #[test]
    fn test_touch_row_uncoded_renders_empty_key() {
        let row = TouchRow {
            row_index: 3,
            trial_index: 1,
            participant_id: -1,
            real_participant_id: None,
            touch_x_cm: 10.0,
            touch_y_cm: 20.0,
            heat_ms: 16,
            relative_mode: false,
            cooperative: true,
        };
        assert_eq!(row.to_csv_line(), "3,1,-1,,10,20,16,0,1");
        assert_eq!(
            row.to_csv_line().split(',').count(),
            TOUCH_DATA_HEADER.len()
        );
    }
}
