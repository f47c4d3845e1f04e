//! Per-trial replay: the stateful walk over a trial's event stream.
//!
//! The main pass feeds every event through the entity tracker and identity
//! resolver, emitting kill rows as hits arrive. Touch output needs a second
//! pass: a touch that lands in an ambiguous region is only coded once a
//! later move reaches an unambiguous position, but each emitted row must
//! reflect only state that existed at its own timestamp. Pass 2 therefore
//! replays the cached stream with fresh cursor state and uses the completed
//! Pass-1 coding.

use std::collections::HashMap;
use std::io::Write;

use trialscope_common::error::{TrialscopeError, TrialscopeResult};
use trialscope_common::screen::{euclidean, ScreenGeometry};
use trialscope_trial_model::event::{EnemyType, EventKind, TimestampMs};
use trialscope_trial_model::trial::{EventFilter, Trial};
use trialscope_trial_model::wave::{WaveContext, WaveScript};

use crate::classify::WorkspaceLayout;
use crate::entities::{Cursor, Enemy, EntityState, Workspace};
use crate::identity::ParticipantRegistry;
use crate::rows::{
    KillRow, ScriptRole, TouchRow, KILL_DATA_HEADER, TOUCH_DATA_HEADER,
};
use crate::touch::{OccurrenceKey, TouchCoder};

/// Which CSV a run produces. The modes are mutually exclusive and select
/// both the output columns and the event ignore-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    KillData,
    TouchData,
}

impl OutputMode {
    /// The ignore-set for this mode. Touch output needs the raw touch
    /// stream, so its filter keeps everything.
    pub fn filter(&self) -> EventFilter {
        match self {
            OutputMode::KillData => EventFilter::kill_data(),
            OutputMode::TouchData => EventFilter::none(),
        }
    }

    /// CSV header row for this mode.
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            OutputMode::KillData => KILL_DATA_HEADER,
            OutputMode::TouchData => TOUCH_DATA_HEADER,
        }
    }
}

/// State that outlives a single trial: the run-wide row index and the
/// wave-metadata cursor. Owned by the top-level driver and threaded through
/// every replay by reference.
pub struct RunContext {
    row_index: i64,
    waves: WaveScript,
}

impl RunContext {
    pub fn new(waves: WaveScript) -> Self {
        Self {
            row_index: -1,
            waves,
        }
    }

    /// Rows emitted so far across the whole run.
    pub fn rows_emitted(&self) -> u64 {
        (self.row_index + 1) as u64
    }

    fn next_row_index(&mut self) -> i64 {
        self.row_index += 1;
        self.row_index
    }

    fn next_wave(&mut self) -> TrialscopeResult<WaveContext> {
        self.waves.next_wave()
    }
}

/// Groups near-simultaneous kills of one enemy type. Two hits whose
/// timestamps are identical or 1 ms apart share a group; a gap of 2 ms or
/// more starts the next one.
#[derive(Debug)]
struct GroupCounter {
    id: i64,
    last_ms: Option<TimestampMs>,
}

impl GroupCounter {
    fn new() -> Self {
        Self { id: -1, last_ms: None }
    }

    fn observe(&mut self, timestamp_ms: TimestampMs) -> i64 {
        let grouped = matches!(
            self.last_ms,
            Some(last) if timestamp_ms == last || timestamp_ms == last + 1
        );
        if !grouped {
            self.id += 1;
        }
        self.last_ms = Some(timestamp_ms);
        self.id
    }
}

/// Replay one trial, appending output rows for the selected mode.
pub fn replay_trial(
    trial: &mut Trial,
    trial_index: usize,
    mode: OutputMode,
    screen: &ScreenGeometry,
    ctx: &mut RunContext,
    out: &mut dyn Write,
) -> TrialscopeResult<()> {
    let path = trial.path().to_path_buf();
    let cooperative = trial.attributes().get_bool("cooperative").ok_or_else(|| {
        TrialscopeError::log_format(&path, 1, "missing required attribute \"cooperative\"")
    })?;
    let movable = trial
        .attributes()
        .get_bool("movableWorkspaces")
        .unwrap_or(false);
    let layout = WorkspaceLayout::for_trial(movable);

    let mut state = EntityState::new();
    let mut registry = ParticipantRegistry::new();
    let mut coder = TouchCoder::new();
    let mut block_index: i64 = -1;
    let mut wave_index: i64 = -1;
    let mut within_wave_index: i64 = -1;
    let mut wave: Option<WaveContext> = None;
    let mut cannon = GroupCounter::new();
    let mut black_hole = GroupCounter::new();

    let events = trial.events()?;
    for event in events {
        let line = event.line;
        let ts = event.timestamp_ms;
        match &event.kind {
            EventKind::DamageTakenChanged { participant } => {
                // Older logs never recorded which participant owned which
                // workspace; damage events iterated the workspaces
                // left-to-right, so first appearance order recovers it.
                if let Some(index) = registry.observe_damage(participant) {
                    state.upsert_workspace(Workspace {
                        participant: participant.clone(),
                        x: screen.width_cm * 0.25 * (1.0 + index as f64 * 2.0),
                        y: screen.height_cm * 0.5,
                    });
                }
            }
            EventKind::WorkspaceInitialized { participant, x, y } => {
                registry.observe_initialized(participant);
                state.upsert_workspace(Workspace {
                    participant: participant.clone(),
                    x: screen.px_to_cm(*x),
                    y: screen.px_to_cm(*y),
                });
            }
            EventKind::WorkspaceMoved { participant, x, y } => {
                if !state.move_workspace(participant, screen.px_to_cm(*x), screen.px_to_cm(*y)) {
                    return Err(TrialscopeError::unknown_entity(
                        &path,
                        line,
                        format!("workspace moved for unknown participant {participant:?}"),
                    ));
                }
            }
            EventKind::CursorSpawned { participant, x, y } => {
                state
                    .spawn_cursor(Cursor::spawn(
                        participant.clone(),
                        screen.px_to_cm(*x),
                        screen.px_to_cm(*y),
                        ts,
                    ))
                    .map_err(|_| {
                        TrialscopeError::protocol(
                            &path,
                            line,
                            format!("duplicate cursor spawn for {participant:?}"),
                        )
                    })?;
            }
            EventKind::CursorMoved { participant, x, y } => {
                if !state.move_cursor(participant, screen.px_to_cm(*x), screen.px_to_cm(*y)) {
                    return Err(TrialscopeError::unknown_entity(
                        &path,
                        line,
                        format!("cursor moved for {participant:?} but none is live"),
                    ));
                }
            }
            EventKind::CursorDespawned { participant } => {
                if state.despawn_cursor(participant).is_none() {
                    return Err(TrialscopeError::protocol(
                        &path,
                        line,
                        format!("cursor despawned for {participant:?} but never spawned"),
                    ));
                }
            }
            EventKind::BeginBlock => block_index += 1,
            EventKind::BeginWave { wave_number } => {
                wave_index = i64::from(*wave_number);
                within_wave_index = -1;
                wave = Some(ctx.next_wave()?);
            }
            EventKind::EnemySpawned {
                id,
                x,
                y,
                r,
                enemy_type,
            } => {
                state
                    .spawn_enemy(Enemy::spawn(
                        *id,
                        *enemy_type,
                        screen.px_to_cm(*x),
                        screen.px_to_cm(*y),
                        screen.px_to_cm(*r),
                        ts,
                    ))
                    .map_err(|_| {
                        TrialscopeError::protocol(
                            &path,
                            line,
                            format!("duplicate spawn for enemy id {id}"),
                        )
                    })?;
            }
            EventKind::EnemyMoved { id, x, y } => {
                // Tolerated for unknown ids: removal is lazy in the client,
                // so one trailing move follows every hit.
                state.move_enemy(*id, screen.px_to_cm(*x), screen.px_to_cm(*y));
            }
            EventKind::EnemyHit {
                id,
                x,
                y,
                participant,
                enemy_type,
            } => {
                let Some(enemy) = state.enemy(*id) else {
                    return Err(TrialscopeError::protocol(
                        &path,
                        line,
                        format!("hit references unknown enemy id {id}"),
                    ));
                };
                if mode == OutputMode::KillData {
                    within_wave_index += 1;
                    let workspace = state.workspace(participant).ok_or_else(|| {
                        TrialscopeError::unknown_entity(
                            &path,
                            line,
                            format!("hit by participant {participant:?} with no workspace"),
                        )
                    })?;
                    let participant_id = registry.lookup(participant).ok_or_else(|| {
                        TrialscopeError::unknown_entity(
                            &path,
                            line,
                            format!("hit by unregistered participant {participant:?}"),
                        )
                    })?;
                    let context = wave.ok_or_else(|| {
                        TrialscopeError::protocol(
                            &path,
                            line,
                            "enemy hit before the first wave began",
                        )
                    })?;
                    let cursor = state.cursor(participant);

                    let cannon_blast_id = if *enemy_type == EnemyType::Cannon {
                        cannon.observe(ts)
                    } else {
                        0
                    };
                    let black_hole_encircle_id = if *enemy_type == EnemyType::BlackHole {
                        black_hole.observe(ts)
                    } else {
                        0
                    };

                    let hit_x_cm = screen.px_to_cm(*x);
                    let row = KillRow {
                        row_index: ctx.next_row_index(),
                        trial_index,
                        enemy_id: enemy.id,
                        enemy_type: enemy.enemy_type,
                        script_role: script_role(*enemy_type, &context, screen.on_left_half_px(*x)),
                        enemy_x_cm: hit_x_cm,
                        enemy_y_cm: screen.px_to_cm(*y),
                        live_time_ms: ts - enemy.spawn_time_ms,
                        distance_travelled_cm: enemy.distance_travelled,
                        block_index,
                        wave_index,
                        within_wave_index,
                        participant_id,
                        real_participant_id: participant.clone(),
                        same_side: !(screen.on_left_half_cm(workspace.x)
                            ^ screen.on_left_half_cm(hit_x_cm)),
                        used_cursor: cursor.is_some(),
                        cursor_distance_travelled_cm: cursor
                            .map_or(0.0, |c| c.distance_travelled),
                        cursor_displacement_cm: cursor.map_or(0.0, Cursor::displacement),
                        distance_from_workspace_cm: euclidean(
                            enemy.x - workspace.x,
                            enemy.y - workspace.y,
                        ),
                        distance_from_cursor_spawn_cm: cursor.map_or(0.0, |c| {
                            euclidean(enemy.x - c.spawn_x, enemy.y - c.spawn_y)
                        }),
                        cannon_blast_id,
                        black_hole_encircle_id,
                        cooperative,
                    };
                    writeln!(out, "{}", row.to_csv_line())?;
                }
                state.remove_enemy(*id);
            }
            EventKind::EnemyCollide { id } => {
                if state.remove_enemy(*id).is_none() {
                    return Err(TrialscopeError::protocol(
                        &path,
                        line,
                        format!("collision references unknown enemy id {id}"),
                    ));
                }
            }
            EventKind::RawTouchDown { id, x, y } => {
                let key = coder.touch_down(*id);
                if let Some(workspace) = layout.classify(screen, state.workspaces(), *x, *y) {
                    let participant = workspace.participant.clone();
                    coder.code(key, &participant);
                }
            }
            EventKind::RawTouchMove { id, x, y } => {
                let key = coder.current(*id).ok_or_else(|| {
                    TrialscopeError::unknown_entity(
                        &path,
                        line,
                        format!("touch move for id {id} with no preceding touch down"),
                    )
                })?;
                if !coder.is_coded(key) {
                    if let Some(workspace) = layout.classify(screen, state.workspaces(), *x, *y) {
                        let participant = workspace.participant.clone();
                        coder.code(key, &participant);
                    }
                }
            }
            EventKind::Startup { .. }
            | EventKind::RawTouchUp { .. }
            | EventKind::Other { .. } => {}
        }
    }

    if mode == OutputMode::TouchData {
        emit_touch_rows(
            trial,
            trial_index,
            cooperative,
            screen,
            &coder,
            &registry,
            ctx,
            out,
        )?;
    }

    tracing::info!(
        path = %path.display(),
        trial_index,
        total_rows = ctx.rows_emitted(),
        "replayed trial"
    );
    Ok(())
}

/// Pass 2: emit one row per raw touch move, using the completed Pass-1
/// coding. Cursor state is tracked from scratch so each row reflects only
/// the past of its own, unfiltered stream.
fn emit_touch_rows(
    trial: &mut Trial,
    trial_index: usize,
    cooperative: bool,
    screen: &ScreenGeometry,
    coder: &TouchCoder,
    registry: &ParticipantRegistry,
    ctx: &mut RunContext,
    out: &mut dyn Write,
) -> TrialscopeResult<()> {
    let path = trial.path().to_path_buf();
    let mut cursors = EntityState::new();
    let mut occurrences: HashMap<i64, u32> = HashMap::new();
    let mut last_seen: HashMap<OccurrenceKey, TimestampMs> = HashMap::new();

    let events = trial.events()?;
    for event in events {
        let line = event.line;
        let ts = event.timestamp_ms;
        match &event.kind {
            EventKind::RawTouchDown { id, .. } => {
                let index = occurrences
                    .entry(*id)
                    .and_modify(|i| *i += 1)
                    .or_insert(0);
                last_seen.insert((*id, *index), ts);
            }
            EventKind::RawTouchMove { id, x, y } => {
                let index = *occurrences.get(id).ok_or_else(|| {
                    TrialscopeError::unknown_entity(
                        &path,
                        line,
                        format!("touch move for id {id} with no preceding touch down"),
                    )
                })?;
                let key = (*id, index);
                let previous_ms = last_seen.insert(key, ts).unwrap_or(ts);
                let participant = coder.coded(key);
                let row = TouchRow {
                    row_index: ctx.next_row_index(),
                    trial_index,
                    participant_id: participant
                        .map_or(-1, |p| registry.lookup_or_unknown(p)),
                    real_participant_id: participant.map(str::to_string),
                    touch_x_cm: screen.px_to_cm(*x),
                    touch_y_cm: screen.px_to_cm(*y),
                    heat_ms: ts - previous_ms,
                    relative_mode: participant.is_some_and(|p| cursors.cursor(p).is_some()),
                    cooperative,
                };
                writeln!(out, "{}", row.to_csv_line())?;
            }
            EventKind::CursorSpawned { participant, x, y } => {
                cursors
                    .spawn_cursor(Cursor::spawn(
                        participant.clone(),
                        screen.px_to_cm(*x),
                        screen.px_to_cm(*y),
                        ts,
                    ))
                    .map_err(|_| {
                        TrialscopeError::protocol(
                            &path,
                            line,
                            format!("duplicate cursor spawn for {participant:?}"),
                        )
                    })?;
            }
            EventKind::CursorMoved { participant, x, y } => {
                if !cursors.move_cursor(participant, screen.px_to_cm(*x), screen.px_to_cm(*y)) {
                    return Err(TrialscopeError::unknown_entity(
                        &path,
                        line,
                        format!("cursor moved for {participant:?} but none is live"),
                    ));
                }
            }
            EventKind::CursorDespawned { participant } => {
                if cursors.despawn_cursor(participant).is_none() {
                    return Err(TrialscopeError::protocol(
                        &path,
                        line,
                        format!("cursor despawned for {participant:?} but never spawned"),
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// How a kill relates to the wave's side assignment. An enemy dying on the
/// half its type was assigned to is `Main`; on the opposite half it is a
/// cross-technique `Sub` kill; the third type is `Flank` wherever it dies.
fn script_role(enemy_type: EnemyType, wave: &WaveContext, on_left_half: bool) -> ScriptRole {
    if (enemy_type == wave.left_type && on_left_half)
        || (enemy_type == wave.right_type && !on_left_half)
    {
        ScriptRole::Main
    } else if (enemy_type == wave.right_type && on_left_half)
        || (enemy_type == wave.left_type && !on_left_half)
    {
        ScriptRole::Sub
    } else {
        ScriptRole::Flank
    }
}
