//! Trial files and their event sequences.
//!
//! A [`Trial`] wraps one raw log file. Opening it parses the `key=value`
//! attribute tokens embedded in the file name and consumes the mandatory
//! `System.Startup` event; the remaining stream is materialized on the first
//! call to [`Trial::events`] and cached, so a second pass replays the
//! identical events without re-reading the source.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use regex::Regex;

use trialscope_common::error::{TrialscopeError, TrialscopeResult};

use crate::event::{split_line, EventKind, TimestampMs, TrialEvent};

/// Identifiers skipped before payload parsing. These dominate log volume and
/// the kill-data analysis never reads them.
const KILL_DATA_IGNORED: [&str; 8] = [
    "Hybrid.DeadZoneChanged",
    "Input.RawTouchDown",
    "Input.RawTouchUp",
    "Input.RawTouchMove",
    "Input.TouchDown",
    "Input.TouchUp",
    "Input.TouchMove",
    "Trial.WeaponMoved",
];

/// An immutable ignore-set applied while decoding a trial's event stream.
///
/// Each run constructs the filter it wants and hands it to [`Trial::open`];
/// there is no shared mutable filtering state between runs.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    ignored: HashSet<&'static str>,
}

impl EventFilter {
    /// The kill-data ignore-set: high-volume input events the kill analysis
    /// never consumes.
    pub fn kill_data() -> Self {
        Self {
            ignored: KILL_DATA_IGNORED.into_iter().collect(),
        }
    }

    /// An empty filter; every event survives. Touch coding needs the raw
    /// touch stream, so the touch-data mode uses this.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether events with this identifier are skipped.
    pub fn ignores(&self, identifier: &str) -> bool {
        self.ignored.contains(identifier)
    }
}

/// Trial-level attributes merged from the file name and the startup payload.
#[derive(Debug, Clone, Default)]
pub struct TrialAttributes {
    values: serde_json::Map<String, serde_json::Value>,
    start_time: Option<NaiveDateTime>,
}

impl TrialAttributes {
    /// Look up an attribute, trying the exact key and then its ASCII
    /// lowercase form (file-name keys are stored lowercased).
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values
            .get(key)
            .or_else(|| self.values.get(&key.to_ascii_lowercase()))
    }

    /// String form of an attribute.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    /// Boolean form of an attribute. JSON booleans pass through; strings
    /// compare case-insensitively against "true"; numbers are true when
    /// non-zero.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::String(s) => Some(s.eq_ignore_ascii_case("true")),
            serde_json::Value::Number(n) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
            _ => None,
        }
    }

    /// Wall-clock time the trial started, from the startup payload.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.start_time
    }

    /// `key: value` pairs sorted by key, for human-readable summaries.
    pub fn summary(&self) -> String {
        let mut pairs: Vec<(&String, &serde_json::Value)> = self.values.iter().collect();
        pairs.sort_by_key(|(k, _)| k.as_str());
        pairs
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{k}: {s}"),
                other => format!("{k}: {other}"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One recorded trial, backed by one log file.
#[derive(Debug)]
pub struct Trial {
    path: PathBuf,
    attributes: TrialAttributes,
    filter: EventFilter,
    reader: Option<Lines<BufReader<File>>>,
    next_line: usize,
    last_timestamp_ms: TimestampMs,
    cache: Option<Vec<TrialEvent>>,
}

impl Trial {
    /// Open a trial log, parse its file-name attributes, and consume the
    /// mandatory `System.Startup` event.
    pub fn open(path: impl Into<PathBuf>, filter: EventFilter) -> TrialscopeResult<Self> {
        let path = path.into();
        let file = File::open(&path).map_err(|_| TrialscopeError::FileNotFound {
            path: path.clone(),
        })?;

        let mut trial = Self {
            attributes: filename_attributes(&path),
            path,
            filter,
            reader: Some(BufReader::new(file).lines()),
            next_line: 1,
            last_timestamp_ms: 0,
            cache: None,
        };

        let startup = trial
            .pull_event()?
            .ok_or_else(|| TrialscopeError::log_format(&trial.path, 1, "empty trial log"))?;
        let EventKind::Startup { attributes } = startup.kind else {
            return Err(TrialscopeError::log_format(
                &trial.path,
                startup.line,
                "first event must be System.Startup",
            ));
        };
        trial.last_timestamp_ms = startup.timestamp_ms;
        trial.fold_startup_attributes(attributes, startup.line)?;

        tracing::debug!(path = %trial.path.display(), "opened trial");
        Ok(trial)
    }

    /// Path of the backing log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Trial-level attributes (file name tokens + startup payload).
    pub fn attributes(&self) -> &TrialAttributes {
        &self.attributes
    }

    /// The trial's event sequence, excluding the startup event.
    ///
    /// The first call drains the source file, enforcing non-decreasing
    /// timestamps; later calls replay the cached events without re-reading.
    pub fn events(&mut self) -> TrialscopeResult<&[TrialEvent]> {
        if self.cache.is_none() {
            let mut events = Vec::new();
            while let Some(event) = self.pull_event()? {
                if event.timestamp_ms < self.last_timestamp_ms {
                    return Err(TrialscopeError::protocol(
                        &self.path,
                        event.line,
                        format!(
                            "timestamp {} ran backwards past {}",
                            event.timestamp_ms, self.last_timestamp_ms
                        ),
                    ));
                }
                self.last_timestamp_ms = event.timestamp_ms;
                events.push(event);
            }
            tracing::debug!(
                path = %self.path.display(),
                count = events.len(),
                "materialized event stream"
            );
            self.cache = Some(events);
        }
        Ok(self.cache.as_deref().unwrap_or_default())
    }

    /// Decode the next non-ignored event from the source, or `None` at EOF.
    fn pull_event(&mut self) -> TrialscopeResult<Option<TrialEvent>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        loop {
            let line_no = self.next_line;
            let Some(line) = reader.next() else {
                self.reader = None;
                return Ok(None);
            };
            self.next_line += 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let (timestamp, identifier, payload) = split_line(&line)
                .map_err(|msg| TrialscopeError::log_format(&self.path, line_no, msg))?;
            if self.filter.ignores(identifier) {
                continue;
            }

            let timestamp_ms: TimestampMs = timestamp.parse().map_err(|_| {
                TrialscopeError::log_format(
                    &self.path,
                    line_no,
                    format!("invalid timestamp {timestamp:?}"),
                )
            })?;
            let kind = EventKind::decode(identifier, payload).map_err(|e| {
                TrialscopeError::log_format(&self.path, line_no, format!("{identifier}: {e}"))
            })?;
            return Ok(Some(TrialEvent {
                timestamp_ms,
                kind,
                line: line_no,
            }));
        }
    }

    /// Merge the startup payload into the attribute map, parsing its `time`
    /// field with the legacy date-time format.
    fn fold_startup_attributes(
        &mut self,
        attributes: serde_json::Map<String, serde_json::Value>,
        line: usize,
    ) -> TrialscopeResult<()> {
        for (key, value) in attributes {
            if key == "time" {
                let raw = value.as_str().ok_or_else(|| {
                    TrialscopeError::log_format(&self.path, line, "startup time is not a string")
                })?;
                let parsed = parse_start_time(raw).ok_or_else(|| {
                    TrialscopeError::log_format(
                        &self.path,
                        line,
                        format!("unparseable startup time {raw:?}"),
                    )
                })?;
                self.attributes.start_time = Some(parsed);
                self.attributes
                    .values
                    .insert(key, serde_json::Value::String(parsed.to_string()));
            } else {
                self.attributes.values.insert(key, value);
            }
        }
        Ok(())
    }
}

/// Extract `key=value` tokens from the trial's path. Keys are lowercased so
/// lookups can be case-insensitive.
fn filename_attributes(path: &Path) -> TrialAttributes {
    let pair_re = Regex::new(r"(\w+)=(\w+)").unwrap();
    let name = path.to_string_lossy();
    let mut attributes = TrialAttributes::default();
    for capture in pair_re.captures_iter(&name) {
        attributes.values.insert(
            capture[1].to_ascii_lowercase(),
            serde_json::Value::String(capture[2].to_string()),
        );
    }
    attributes
}

/// Parse the startup payload's `time` field: `Y-M-D H-M-S` with a 2- or
/// 4-digit year. Two-digit years below 69 land in the 2000s, the rest in
/// the 1900s.
pub fn parse_start_time(raw: &str) -> Option<NaiveDateTime> {
    let re = Regex::new(r"^(\d+)-(\d+)-(\d+) (\d+)-(\d+)-(\d+)").unwrap();
    let caps = re.captures(raw)?;
    let mut year: i32 = caps[1].parse().ok()?;
    if year < 100 {
        year += if year < 69 { 2000 } else { 1900 };
    }
    let date = chrono::NaiveDate::from_ymd_opt(
        year,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )?;
    date.and_hms_opt(
        caps[4].parse().ok()?,
        caps[5].parse().ok()?,
        caps[6].parse().ok()?,
    )
}
