use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

const RECENT_SESSIONS_FILE: &str = "recent_sessions.tsv";
const MAX_RECENT_SESSIONS: usize = 20;
pub const DEFAULT_SESSION_FILE: &str = "StudySession.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentSession {
	pub path: PathBuf,
	pub last_used_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionCatalog {
	entries: Vec<RecentSession>,
}

impl SessionCatalog {
	pub fn load() -> Result<Self, std::io::Error> {
		match fs::read_to_string(state_dir().join(RECENT_SESSIONS_FILE)) {
			Ok(raw) => Ok(Self::parse(&raw)),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self {
				entries: Vec::new(),
			}),
			Err(err) => Err(err),
		}
	}

	fn parse(raw: &str) -> Self {
		let mut entries = raw.lines().filter_map(parse_line).collect::<Vec<_>>();
		entries.sort_by(|left, right| right.last_used_at.cmp(&left.last_used_at));
		Self { entries }
	}

	pub fn entries(&self, limit: usize) -> &[RecentSession] {
		&self.entries[..limit.min(self.entries.len())]
	}

	pub fn most_recent_existing(&self) -> Option<&RecentSession> {
		self.entries.iter().find(|entry| entry.path.exists())
	}

	pub fn touch(&mut self, path: PathBuf, now: DateTime<Utc>) {
		self.entries.retain(|entry| entry.path != path);
		self.entries.insert(
			0,
			RecentSession {
				path,
				last_used_at: now,
			},
		);
		self.entries
			.sort_by(|left, right| right.last_used_at.cmp(&left.last_used_at));
		self.entries.truncate(MAX_RECENT_SESSIONS);
	}

	fn render(&self) -> String {
		let mut contents = String::new();
		for entry in &self.entries {
			contents.push_str(&entry.last_used_at.to_rfc3339());
			contents.push('\t');
			contents.push_str(&entry.path.display().to_string());
			contents.push('\n');
		}
		contents
	}

	pub fn save(&self) -> Result<(), std::io::Error> {
		fs::create_dir_all(state_dir())?;
		fs::write(state_dir().join(RECENT_SESSIONS_FILE), self.render())
	}
}

fn parse_line(line: &str) -> Option<RecentSession> {
	let (timestamp, path) = line.split_once('\t')?;
	let path = path.trim();
	if path.is_empty() {
		return None;
	}

	let last_used_at = DateTime::parse_from_rfc3339(timestamp.trim())
		.ok()?
		.with_timezone(&Utc);
	Some(RecentSession {
		path: PathBuf::from(path),
		last_used_at,
	})
}

pub fn remember_session_file(path: &Path) -> Result<(), std::io::Error> {
	let mut catalog = SessionCatalog::load()?;
	catalog.touch(absolute(path.to_path_buf()), Utc::now());
	catalog.save()
}

pub fn resolve_session_path(cli_path: Option<PathBuf>, configured: Option<PathBuf>) -> PathBuf {
	let explicit = cli_path
		.or_else(|| {
			env::var_os("KAIROS_SESSION_FILE")
				.filter(|value| !value.is_empty())
				.map(PathBuf::from)
		})
		.or(configured);
	if let Some(path) = explicit {
		return absolute(path);
	}

	// A recent entry only wins if its file is still on disk.
	SessionCatalog::load()
		.ok()
		.and_then(|catalog| {
			catalog
				.most_recent_existing()
				.map(|entry| entry.path.clone())
		})
		.unwrap_or_else(|| absolute(PathBuf::from(DEFAULT_SESSION_FILE)))
}

pub fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os("KAIROS_STATE_DIR") {
		return PathBuf::from(path);
	}

	platform_state_root().join("kairos_studyplanner")
}

fn platform_state_root() -> PathBuf {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path);
	}

	match env::var_os("HOME") {
		Some(home) => PathBuf::from(home).join(".local").join("state"),
		None => PathBuf::from("."),
	}
}

// Export targets usually do not exist yet, so no canonicalization here.
fn absolute(path: PathBuf) -> PathBuf {
	if path.is_absolute() {
		path
	} else {
		env::current_dir()
			.map(|cwd| cwd.join(&path))
			.unwrap_or(path)
	}
}

#[cfg(test)]
mod tests {
	use chrono::{TimeZone, Utc};
	use std::path::PathBuf;

	use super::SessionCatalog;

	#[test]
	fn orders_parsed_entries_most_recent_first_and_skips_malformed_lines() {
		let catalog = SessionCatalog::parse(
			"2026-03-01T09:00:00+00:00\t/tmp/a.csv\n\
			 not a timestamp\t/tmp/bad.csv\n\
			 2026-03-01T11:00:00+00:00\t/tmp/b.csv\n\
			 2026-03-01T10:00:00+00:00\t\n\
			 /tmp/no-timestamp.csv\n",
		);

		let entries = catalog.entries(10);
		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].path, PathBuf::from("/tmp/b.csv"));
		assert_eq!(entries[1].path, PathBuf::from("/tmp/a.csv"));
		assert_eq!(catalog.entries(1).len(), 1);
	}

	#[test]
	fn touch_restamps_a_known_path_and_fronts_it() {
		let mut catalog = SessionCatalog::parse(
			"2026-03-01T09:00:00+00:00\t/tmp/a.csv\n\
			 2026-03-01T10:00:00+00:00\t/tmp/b.csv\n",
		);

		let later = Utc.with_ymd_and_hms(2026, 3, 1, 11, 0, 0).unwrap();
		catalog.touch(PathBuf::from("/tmp/a.csv"), later);

		let entries = catalog.entries(10);
		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].path, PathBuf::from("/tmp/a.csv"));
		assert_eq!(entries[0].last_used_at, later);
		assert_eq!(entries[1].path, PathBuf::from("/tmp/b.csv"));

		let newest = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
		catalog.touch(PathBuf::from("/tmp/c.csv"), newest);
		assert_eq!(catalog.entries(10).len(), 3);
		assert_eq!(catalog.entries(10)[0].path, PathBuf::from("/tmp/c.csv"));
	}

	#[test]
	fn renders_what_it_parses() {
		let mut catalog = SessionCatalog::parse("");
		catalog.touch(
			PathBuf::from("/tmp/a.csv"),
			Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
		);
		catalog.touch(
			PathBuf::from("/tmp/b.csv"),
			Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
		);

		let reparsed = SessionCatalog::parse(&catalog.render());
		assert_eq!(reparsed.entries(10), catalog.entries(10));
	}
}
