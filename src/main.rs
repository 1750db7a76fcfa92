mod codec;
mod config;
mod domain;
mod quotes;
mod sessions;
mod ui;

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Parser, Subcommand};

use crate::codec::load_session;
use crate::config::{load_config, PlannerConfig};
use crate::domain::{minutes_left_in_day, Session};
use crate::quotes::{load_quotes, pick_random, Quote};
use crate::sessions::{remember_session_file, resolve_session_path, SessionCatalog};
use crate::ui::run_dashboard;

const DEFAULT_QUOTES_FILE: &str = "assets/data/quotes.csv";

#[derive(Debug, Parser)]
#[command(name = "kairos-studyplanner", about = "Terminal-first study session planner")]
struct Cli {
	#[arg(long)]
	session: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Plan {
		#[arg(long)]
		owner: String,
		#[arg(long)]
		hours: u32,
	},
	Open {
		#[arg(long)]
		file: Option<PathBuf>,
	},
	Summary {
		#[arg(long)]
		file: Option<PathBuf>,
	},
	Quote,
	Sessions {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let config = match load_config() {
		Ok(config) => config,
		Err(err) => {
			eprintln!("warning: {err}");
			PlannerConfig::default()
		}
	};

	match cli.command {
		Some(Command::Sessions { limit }) => print_recent_sessions(limit),
		Some(Command::Quote) => {
			print_random_quote(&config);
			Ok(())
		}
		Some(Command::Summary { file }) => {
			let path = resolve_session_path(file.or(cli.session), config.export_file.clone());
			print_summary(&path)
		}
		Some(Command::Open { file }) => {
			let mut session_path =
				resolve_session_path(file.or(cli.session), config.export_file.clone());
			let mut session = Some(load_session(&session_path)?);
			if let Err(err) = remember_session_file(&session_path) {
				eprintln!("warning: failed to store recent session: {err}");
			}
			let quotes = load_startup_quotes(&config);
			run_dashboard(&mut session, &mut session_path, &quotes)
		}
		Some(Command::Plan { owner, hours }) => {
			let planned_minutes = hours.saturating_mul(60);
			if planned_minutes > minutes_left_in_day(Local::now()) {
				return Err("not enough time left today to study that much".into());
			}

			let mut session_path = resolve_session_path(cli.session, config.export_file.clone());
			let mut session = Some(Session::new(owner, planned_minutes)?);
			let quotes = load_startup_quotes(&config);
			run_dashboard(&mut session, &mut session_path, &quotes)
		}
		None => {
			let mut session_path = resolve_session_path(cli.session, config.export_file.clone());
			let mut session = session_from_config(&config);
			let quotes = load_startup_quotes(&config);
			run_dashboard(&mut session, &mut session_path, &quotes)
		}
	}
}

fn session_from_config(config: &PlannerConfig) -> Option<Session> {
	let owner = config.owner_name.clone()?;
	let hours = config.planned_hours?;
	let planned_minutes = hours.saturating_mul(60);
	if planned_minutes > minutes_left_in_day(Local::now()) {
		eprintln!("warning: configured plan exceeds the time left today, starting without one");
		return None;
	}

	match Session::new(owner, planned_minutes) {
		Ok(session) => Some(session),
		Err(err) => {
			eprintln!("warning: configured plan is unusable: {err}");
			None
		}
	}
}

fn load_startup_quotes(config: &PlannerConfig) -> Vec<Quote> {
	let path = config
		.quotes_file
		.clone()
		.unwrap_or_else(|| PathBuf::from(DEFAULT_QUOTES_FILE));

	if !path.exists() {
		if config.quotes_file.is_some() {
			eprintln!("warning: quotes file not found: {}", path.display());
		}
		return Vec::new();
	}

	match load_quotes(&path) {
		Ok(quotes) => quotes,
		Err(err) => {
			eprintln!("warning: failed to load quotes: {err}");
			Vec::new()
		}
	}
}

fn print_random_quote(config: &PlannerConfig) {
	let quotes = load_startup_quotes(config);
	match pick_random(&quotes) {
		Some(quote) => println!("\"{}\" - {}", quote.quote, quote.author),
		None => println!("no quotes available"),
	}
}

fn print_recent_sessions(limit: usize) -> Result<(), Box<dyn Error>> {
	let catalog = SessionCatalog::load()?;
	let rows = catalog.entries(limit);
	if rows.is_empty() {
		println!("no recent session files");
		return Ok(());
	}

	for (index, entry) in rows.iter().enumerate() {
		println!(
			"{:>2}. {} (last used {})",
			index + 1,
			entry.path.display(),
			entry.last_used_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
		);
	}

	Ok(())
}

fn print_summary(path: &Path) -> Result<(), Box<dyn Error>> {
	let session = load_session(path)?;

	println!("session file: {}", path.display());
	if !session.owner_name.is_empty() {
		println!("owner: {}", session.owner_name);
	}

	println!("\ncompleted tasks:");
	if session.done.is_empty() {
		println!("(none)");
	}
	for task in &session.done {
		println!(
			"{} | planned {} min | used {} min{}",
			task.name,
			task.planned_minutes,
			task.actual_used_minutes,
			task.description
				.as_ref()
				.map(|description| format!(" | {description}"))
				.unwrap_or_default()
		);
	}

	println!("\npending tasks:");
	if session.pending.is_empty() {
		println!("(none)");
	}
	for task in &session.pending {
		println!(
			"{} | planned {} min{}",
			task.name,
			task.planned_minutes,
			task.description
				.as_ref()
				.map(|description| format!(" | {description}"))
				.unwrap_or_default()
		);
	}

	println!(
		"\nstill committed: {} min | actually used: {} min",
		session.pending_planned_minutes(),
		session.used_minutes_total()
	);

	Ok(())
}
