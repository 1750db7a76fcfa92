use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Session, Task, generate_id};

const STATUS_DONE: &str = "Done";
const STATUS_TODO: &str = "Todo";

#[derive(Debug)]
pub enum CodecError {
    Io(std::io::Error),
    Csv(csv::Error),
    MalformedSession(String),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Io(err) => write!(f, "io error: {err}"),
            CodecError::Csv(err) => write!(f, "failed to read session file: {err}"),
            CodecError::MalformedSession(reason) => {
                write!(f, "malformed session file: {reason}")
            }
        }
    }
}

impl std::error::Error for CodecError {}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionRow {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "Task", default)]
    task: String,
    #[serde(rename = "Minutes", default)]
    minutes: String,
    #[serde(rename = "UsedMinutes", default)]
    used_minutes: String,
    #[serde(rename = "StartTime", default)]
    start_time: String,
    #[serde(rename = "CompletedTime", default)]
    completed_time: String,
    #[serde(rename = "Description", default)]
    description: String,
}

pub fn save_session(path: &Path, session: &Session) -> Result<(), CodecError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(CodecError::Io)?;
        }
    }

    let mut writer = csv::Writer::from_path(path).map_err(CodecError::Csv)?;
    writer
        .serialize(identity_row(&session.owner_name))
        .map_err(CodecError::Csv)?;
    for task in &session.done {
        writer.serialize(done_row(task)).map_err(CodecError::Csv)?;
    }
    for task in &session.pending {
        writer.serialize(todo_row(task)).map_err(CodecError::Csv)?;
    }
    writer.flush().map_err(CodecError::Io)?;
    Ok(())
}

pub fn load_session(path: &Path) -> Result<Session, CodecError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(CodecError::Csv)?;

    let mut rows = Vec::new();
    for row in reader.deserialize::<SessionRow>() {
        rows.push(row.map_err(CodecError::Csv)?);
    }

    decode_rows(rows)
}

fn decode_rows(rows: Vec<SessionRow>) -> Result<Session, CodecError> {
    let Some(first) = rows.first() else {
        return Err(CodecError::MalformedSession(
            "the file contains no rows".to_string(),
        ));
    };
    if first.name.trim().is_empty() && first.status.trim().is_empty() {
        return Err(CodecError::MalformedSession(
            "the first row carries neither a name nor a status".to_string(),
        ));
    }

    let owner_name = first.name.trim().to_string();
    // Without an identity row the tasks start immediately and the owner stays blank.
    let task_rows = if owner_name.is_empty() {
        &rows[..]
    } else {
        &rows[1..]
    };

    let mut pending = Vec::new();
    let mut done = Vec::new();
    for row in task_rows {
        match row.status.trim() {
            STATUS_DONE => done.push(done_task(row)),
            STATUS_TODO => pending.push(todo_task(row)),
            _ => {}
        }
    }

    Ok(Session::restore(owner_name, pending, done))
}

fn identity_row(owner_name: &str) -> SessionRow {
    SessionRow {
        name: owner_name.to_string(),
        ..SessionRow::default()
    }
}

fn done_row(task: &Task) -> SessionRow {
    SessionRow {
        status: STATUS_DONE.to_string(),
        task: task.name.clone(),
        minutes: task.planned_minutes.to_string(),
        used_minutes: task.actual_used_minutes.to_string(),
        start_time: format_timestamp(task.started_at),
        completed_time: format_timestamp(task.completed_at),
        description: task.description.clone().unwrap_or_default(),
        ..SessionRow::default()
    }
}

fn todo_row(task: &Task) -> SessionRow {
    SessionRow {
        status: STATUS_TODO.to_string(),
        task: task.name.clone(),
        minutes: task.planned_minutes.to_string(),
        description: task.description.clone().unwrap_or_default(),
        ..SessionRow::default()
    }
}

fn done_task(row: &SessionRow) -> Task {
    Task {
        id: generate_id(),
        name: row.task.trim().to_string(),
        planned_minutes: parse_minutes(&row.minutes),
        remaining_seconds: 0,
        description: optional_field(&row.description),
        running: false,
        started_at: parse_timestamp(&row.start_time),
        completed_at: parse_timestamp(&row.completed_time),
        actual_used_minutes: parse_minutes(&row.used_minutes),
    }
}

fn todo_task(row: &SessionRow) -> Task {
    let planned_minutes = parse_minutes(&row.minutes);
    Task {
        id: generate_id(),
        name: row.task.trim().to_string(),
        planned_minutes,
        remaining_seconds: planned_minutes.saturating_mul(60),
        description: optional_field(&row.description),
        running: false,
        started_at: None,
        completed_at: None,
        actual_used_minutes: 0,
    }
}

fn parse_minutes(value: &str) -> u32 {
    value.trim().parse().unwrap_or(0)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp
        .map(|timestamp| timestamp.to_rfc3339())
        .unwrap_or_default()
}

fn optional_field(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use std::fs;
    use std::path::PathBuf;

    use crate::domain::Session;

    use super::{CodecError, load_session, save_session};

    #[test]
    fn round_trips_owner_and_both_collections() {
        let mut session =
            Session::new("Lena".to_string(), 120).expect("session should be created");
        let finished = session
            .add_task("Algebra", 30, Some("chapter 4".to_string()))
            .expect("task should be created");
        session
            .add_task("Reading", 45, None)
            .expect("task should be created");

        let started = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        session
            .start_task(&finished, started)
            .expect("start should work");
        session
            .complete_task(&finished, started + Duration::minutes(20))
            .expect("complete should work");

        let path = temp_file("planner_codec_roundtrip.csv");
        save_session(&path, &session).expect("save should succeed");
        let loaded = load_session(&path).expect("load should succeed");

        assert_eq!(loaded.owner_name, "Lena");
        assert_eq!(loaded.done.len(), 1);
        assert_eq!(loaded.pending.len(), 1);

        let done = &loaded.done[0];
        assert_eq!(done.name, "Algebra");
        assert_eq!(done.planned_minutes, 30);
        assert_eq!(done.actual_used_minutes, 20);
        assert_eq!(done.description.as_deref(), Some("chapter 4"));
        assert_eq!(done.started_at, Some(started));
        assert_eq!(done.completed_at, Some(started + Duration::minutes(20)));

        let pending = &loaded.pending[0];
        assert_eq!(pending.name, "Reading");
        assert_eq!(pending.planned_minutes, 45);
        assert_eq!(pending.remaining_seconds, 45 * 60);
        assert!(!pending.running);

        // Pending minutes are re-committed; the plan total is not in the file.
        assert_eq!(loaded.ledger.committed_minutes(), 45);
        assert_eq!(loaded.ledger.total_planned_minutes(), 0);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_empty_file() {
        let path = temp_file("planner_codec_empty.csv");
        fs::write(&path, "").expect("write should succeed");
        let err = load_session(&path).expect_err("empty file must be rejected");
        assert!(matches!(err, CodecError::MalformedSession(_)));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_first_row_without_name_or_status() {
        let path = temp_file("planner_codec_headless.csv");
        fs::write(
            &path,
            "Name,Status,Task,Minutes,UsedMinutes,StartTime,CompletedTime,Description\n,,Algebra,30,,,,\n",
        )
        .expect("write should succeed");
        let err = load_session(&path).expect_err("row without name or status must be rejected");
        assert!(matches!(err, CodecError::MalformedSession(_)));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn accepts_task_rows_without_identity_row() {
        let path = temp_file("planner_codec_no_identity.csv");
        fs::write(
            &path,
            "Name,Status,Task,Minutes,UsedMinutes,StartTime,CompletedTime,Description\n,Todo,Algebra,30,,,,\n",
        )
        .expect("write should succeed");
        let loaded = load_session(&path).expect("load should succeed");
        assert_eq!(loaded.owner_name, "");
        assert_eq!(loaded.pending.len(), 1);
        assert_eq!(loaded.pending[0].name, "Algebra");
        let _ = fs::remove_file(path);
    }

    #[test]
    fn tolerates_unparsable_numbers_and_timestamps() {
        let path = temp_file("planner_codec_garbage.csv");
        fs::write(
            &path,
            "Name,Status,Task,Minutes,UsedMinutes,StartTime,CompletedTime,Description\nLena,,,,,,,\nLena2,Done,Algebra,abc,xyz,not-a-time,also-not,notes\n",
        )
        .expect("write should succeed");
        let loaded = load_session(&path).expect("load should succeed");
        assert_eq!(loaded.owner_name, "Lena");
        assert_eq!(loaded.done.len(), 1);
        let done = &loaded.done[0];
        assert_eq!(done.planned_minutes, 0);
        assert_eq!(done.actual_used_minutes, 0);
        assert!(done.started_at.is_none());
        assert!(done.completed_at.is_none());
        let _ = fs::remove_file(path);
    }

    fn temp_file(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("{}_{}", name, std::process::id()));
        path
    }
}
