use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration as StdDuration, Instant};

use chrono::{Local, Utc};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::codec::{load_session, save_session};
use crate::domain::{
	format_countdown, format_plan_minutes, minutes_left_in_day, Session, Task, TaskEdit, Tick,
};
use crate::quotes::{pick_random, Quote};
use crate::sessions::{remember_session_file, SessionCatalog};

const TICK_INTERVAL: StdDuration = StdDuration::from_secs(1);
const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);

pub fn run_dashboard(
	session: &mut Option<Session>,
	session_path: &mut PathBuf,
	quotes: &[Quote],
) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, session, session_path, quotes);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	session: &mut Option<Session>,
	session_path: &mut PathBuf,
	quotes: &[Quote],
) -> Result<(), Box<dyn Error>> {
	let mut app = initial_app(session);
	let mut last_tick = Instant::now();

	loop {
		apply_ticks(session, &mut app, &mut last_tick);
		app.clamp_selection(session);
		terminal.draw(|frame| draw_dashboard(frame, &app, session.as_ref(), session_path))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => {
						handle_prompt_key(&mut app, key.code, session, session_path);
						false
					}
					InputMode::Select(_) => {
						handle_select_key(&mut app, key.code, session, session_path);
						false
					}
					InputMode::Quote(_) => {
						app.mode = InputMode::Normal;
						false
					}
					InputMode::Normal => {
						handle_normal_key(&mut app, key.code, session, session_path, quotes)
					}
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn initial_app(session: &Option<Session>) -> App {
	let mut app = App::default();
	match session {
		None => {
			app.mode = InputMode::Prompt(PromptState::new("Your name", PromptKind::OwnerName));
		}
		Some(session) if session.ledger.total_planned_minutes() == 0 => {
			// Imported files do not carry the plan total; ask for it up front.
			app.mode = InputMode::Prompt(PromptState::new(
				"Planned hours for this session",
				PromptKind::RevisePlanHours,
			));
		}
		Some(_) => {}
	}
	app
}

fn apply_ticks(session: &mut Option<Session>, app: &mut App, last_tick: &mut Instant) {
	while last_tick.elapsed() >= TICK_INTERVAL {
		*last_tick += TICK_INTERVAL;
		let Some(session) = session.as_mut() else {
			continue;
		};
		if let Tick::Expired { task_id } = session.tick() {
			let name = session
				.pending_task(&task_id)
				.map(|task| task.name.clone())
				.unwrap_or(task_id);
			app.status = format!("time is up: {name}");
		}
	}
}

fn draw_dashboard(frame: &mut Frame, app: &App, session: Option<&Session>, session_path: &Path) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(6), Constraint::Min(10), Constraint::Length(5)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
		.split(layout[1]);

	render_header_panel(frame, layout[0], session);
	render_pending_panel(frame, body[0], app, session);
	render_done_panel(frame, body[1], app, session);
	render_footer(frame, layout[2], app, session_path);

	match &app.mode {
		InputMode::Select(select) => render_select_popup(frame, select),
		InputMode::Quote(quote) => render_quote_popup(frame, quote),
		InputMode::Normal | InputMode::Prompt(_) => {}
	}
}

fn render_header_panel(frame: &mut Frame, area: Rect, session: Option<&Session>) {
	let clock = Local::now().format("%H:%M:%S").to_string();
	let mut lines = Vec::new();

	match session {
		Some(session) => {
			lines.push(Line::from(vec![
				Span::styled(
					format!("Welcome {}!", session.owner_name),
					Style::default().add_modifier(Modifier::BOLD),
				),
				Span::raw(format!("  |  {clock}")),
			]));

			let available = session.available_minutes();
			let plan_style = if available < 0 {
				Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD)
			} else {
				Style::default().fg(Color::LightGreen)
			};
			lines.push(Line::from(Span::styled(
				format!("Remaining Plan: {}", format_plan_minutes(available)),
				plan_style,
			)));
			lines.push(Line::from(format!(
				"plan {} min | committed {} min | used {} min",
				session.ledger.total_planned_minutes(),
				session.ledger.committed_minutes(),
				session.used_minutes_total()
			)));
			if let Some(task) = session.running_task() {
				lines.push(Line::from(Span::styled(
					format!(
						"running: {} ({} left)",
						task.name,
						format_countdown(task.remaining_seconds)
					),
					Style::default().fg(Color::LightGreen),
				)));
			}
		}
		None => {
			lines.push(Line::from(vec![
				Span::styled("No active session", Style::default().fg(Color::DarkGray)),
				Span::raw(format!("  |  {clock}")),
			]));
			lines.push(Line::from("Press n to plan a new session or o to import one"));
		}
	}

	let header = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Study Session"));
	frame.render_widget(header, area);
}

fn render_pending_panel(frame: &mut Frame, area: Rect, app: &App, session: Option<&Session>) {
	let mut items = Vec::new();
	if let Some(session) = session {
		for task in &session.pending {
			items.push(ListItem::new(pending_task_lines(task)));
		}
	}

	let count = items.len();
	let mut state = ListState::default();
	if count > 0 {
		state.select(Some(app.pending_index.min(count - 1)));
	}

	let block = Block::default()
		.borders(Borders::ALL)
		.title(format!("Tasks ({count})"))
		.border_style(border_style(app.focus == FocusPane::Pending));
	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(no pending tasks)")]
	} else {
		items
	})
	.block(block)
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn pending_task_lines(task: &Task) -> Vec<Line<'static>> {
	let countdown_style = if task.remaining_seconds == 0 {
		Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD)
	} else if task.running {
		Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD)
	} else {
		Style::default()
	};

	let mut spans = vec![
		Span::raw(format!("{} - {} min  ", task.name, task.planned_minutes)),
		Span::styled(format_countdown(task.remaining_seconds), countdown_style),
	];
	if task.running {
		spans.push(Span::styled(
			"  RUN",
			Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD),
		));
	}

	let mut lines = vec![Line::from(spans)];
	if let Some(description) = &task.description {
		lines.push(Line::from(Span::styled(
			format!("  {description}"),
			Style::default().fg(Color::DarkGray),
		)));
	}
	lines
}

fn render_done_panel(frame: &mut Frame, area: Rect, app: &App, session: Option<&Session>) {
	let mut items = Vec::new();
	if let Some(session) = session {
		for task in &session.done {
			let mut lines = vec![Line::from(format!(
				"{} - {} min (Done) | used {} min",
				task.name, task.planned_minutes, task.actual_used_minutes
			))];
			if let Some(description) = &task.description {
				lines.push(Line::from(Span::styled(
					format!("  {description}"),
					Style::default().fg(Color::DarkGray),
				)));
			}
			items.push(ListItem::new(lines));
		}
	}

	let count = items.len();
	let mut state = ListState::default();
	if count > 0 {
		state.select(Some(app.done_index.min(count - 1)));
	}

	let block = Block::default()
		.borders(Borders::ALL)
		.title(format!("Completed ({count})"))
		.border_style(border_style(app.focus == FocusPane::Done));
	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(nothing completed yet)")]
	} else {
		items
	})
	.block(block)
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App, session_path: &Path) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("Tab pane | j/k move | space start/stop | Enter complete | a add | e edit | d remove"),
			Line::from(format!(
				"r revise plan | w export | o import | n new session | q quit | file: {}",
				session_path.display()
			)),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
		InputMode::Quote(_) => vec![Line::from("Press any key to continue")],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(62, 45, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let list = List::new(items)
		.block(Block::default().borders(Borders::ALL).title(select.title.clone()))
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len().saturating_sub(1))));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn render_quote_popup(frame: &mut Frame, quote: &QuoteView) {
	let area = centered_rect(56, 38, frame.area());
	frame.render_widget(Clear, area);

	let lines = vec![
		Line::from(""),
		Line::from(format!("\"{}\"", quote.quote)),
		Line::from(""),
		Line::from(Span::styled(
			format!("- {}", quote.author),
			Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
		)),
	];
	let popup = Paragraph::new(lines)
		.wrap(Wrap { trim: true })
		.block(Block::default().borders(Borders::ALL).title("Well done"));
	frame.render_widget(popup, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	session: &mut Option<Session>,
	session_path: &mut PathBuf,
	quotes: &[Quote],
) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Tab | KeyCode::BackTab => {
			app.focus = app.focus.other();
			false
		}
		KeyCode::Up | KeyCode::Char('k') => {
			app.move_selection(-1, session);
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			app.move_selection(1, session);
			false
		}
		KeyCode::Char('n') => {
			app.mode = InputMode::Prompt(PromptState::new("Your name", PromptKind::OwnerName));
			false
		}
		KeyCode::Char('a') => {
			if session.is_some() {
				app.mode = InputMode::Prompt(PromptState::new("Task name", PromptKind::TaskName));
			} else {
				app.status = "start a session first (press n)".to_string();
			}
			false
		}
		KeyCode::Char(' ') => {
			let Some(session) = session.as_mut() else {
				app.status = "start a session first (press n)".to_string();
				return false;
			};
			let Some(task_id) = app.selected_pending_id(session) else {
				app.status = "select a pending task first".to_string();
				return false;
			};

			let is_running = session
				.pending_task(&task_id)
				.map(|task| task.running)
				.unwrap_or(false);
			let result = if is_running {
				session.stop_task(&task_id).map(|()| "stopped".to_string())
			} else {
				session
					.start_task(&task_id, Utc::now())
					.map(|()| "started".to_string())
			};
			app.status = match result {
				Ok(verb) => {
					let name = session
						.pending_task(&task_id)
						.map(|task| task.name.clone())
						.unwrap_or_default();
					format!("{verb}: {name}")
				}
				Err(err) => format!("error: {err}"),
			};
			false
		}
		KeyCode::Enter => {
			let Some(session) = session.as_mut() else {
				return false;
			};
			if app.focus != FocusPane::Pending {
				return false;
			}
			let Some(task_id) = app.selected_pending_id(session) else {
				app.status = "select a pending task first".to_string();
				return false;
			};

			match session.complete_task(&task_id, Utc::now()) {
				Ok(task) => {
					let name = task.name.clone();
					let used = task.actual_used_minutes;
					app.status = format!("completed: {name} ({used} min used)");
					if let Some(quote) = pick_random(quotes) {
						app.mode = InputMode::Quote(QuoteView {
							quote: quote.quote.clone(),
							author: quote.author.clone(),
						});
					}
				}
				Err(err) => app.status = format!("error: {err}"),
			}
			false
		}
		KeyCode::Char('e') => {
			let Some(session) = session.as_ref() else {
				app.status = "start a session first (press n)".to_string();
				return false;
			};
			let Some(task_id) = app.selected_pending_id(session) else {
				app.status = "select a pending task first".to_string();
				return false;
			};
			let Some(task) = session.pending_task(&task_id) else {
				return false;
			};
			if task.running {
				app.status = "stop the task before editing".to_string();
				return false;
			}

			app.mode = InputMode::Prompt(PromptState::with_input(
				"Edit task name",
				PromptKind::EditTaskName { task_id },
				task.name.clone(),
			));
			false
		}
		KeyCode::Char('d') => {
			let Some(session) = session.as_ref() else {
				app.status = "start a session first (press n)".to_string();
				return false;
			};
			let Some(task_id) = app.selected_pending_id(session) else {
				app.status = "select a pending task first".to_string();
				return false;
			};
			let Some(task) = session.pending_task(&task_id) else {
				return false;
			};
			if task.running {
				app.status = "stop the task before removing it".to_string();
				return false;
			}

			app.mode = InputMode::Select(build_remove_confirm_select(task_id, task.name.clone()));
			false
		}
		KeyCode::Char('r') => {
			if session.is_some() {
				app.mode = InputMode::Prompt(PromptState::new(
					"New planned hours",
					PromptKind::RevisePlanHours,
				));
			} else {
				app.status = "start a session first (press n)".to_string();
			}
			false
		}
		KeyCode::Char('w') => {
			if session.is_some() {
				app.mode = InputMode::Prompt(PromptState::new(
					format!("Export file (empty = {})", session_path.display()),
					PromptKind::ExportPath,
				));
			} else {
				app.status = "nothing to export yet".to_string();
			}
			false
		}
		KeyCode::Char('o') => {
			match build_import_select(session_path.as_path()) {
				Ok(select) => app.mode = InputMode::Select(select),
				Err(err) => app.status = err,
			}
			false
		}
		_ => false,
	}
}

fn handle_prompt_key(
	app: &mut App,
	code: KeyCode,
	session: &mut Option<Session>,
	session_path: &mut PathBuf,
) {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				other => {
					app.mode = other;
					return;
				}
			};

			match submit_prompt(prompt.clone(), session, session_path) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => {
					app.mode = InputMode::Prompt(next_prompt)
				}
				Ok(PromptOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}
}

fn handle_select_key(
	app: &mut App,
	code: KeyCode,
	session: &mut Option<Session>,
	session_path: &mut PathBuf,
) {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				other => {
					app.mode = other;
					return;
				}
			};

			match submit_select(select.clone(), session, session_path) {
				Ok(SelectOutcome::NextPrompt(prompt)) => app.mode = InputMode::Prompt(prompt),
				Ok(SelectOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}
}

fn submit_prompt(
	prompt: PromptState,
	session: &mut Option<Session>,
	session_path: &mut PathBuf,
) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::OwnerName => {
			let owner_name = required_text(&prompt.input, "your name")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Planned study hours",
				PromptKind::PlannedHours { owner_name },
			)))
		}
		PromptKind::PlannedHours { owner_name } => {
			let hours = parse_number(&prompt.input, "planned hours")?;
			let planned_minutes = hours.saturating_mul(60);
			if planned_minutes > minutes_left_in_day(Local::now()) {
				return Err("not enough time left today to study that much".to_string());
			}

			let welcome = format!("Welcome {owner_name}!");
			*session =
				Some(Session::new(owner_name, planned_minutes).map_err(|err| err.to_string())?);
			Ok(PromptOutcome::Done(welcome))
		}
		PromptKind::RevisePlanHours => {
			let session = session.as_mut().ok_or("no active session")?;
			let hours = parse_number(&prompt.input, "planned hours")?;
			session.revise_plan(hours.saturating_mul(60));
			Ok(PromptOutcome::Done(format!(
				"plan set to {}",
				format_plan_minutes(i64::from(hours) * 60)
			)))
		}
		PromptKind::TaskName => {
			let name = required_text(&prompt.input, "task name")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Planned minutes",
				PromptKind::TaskMinutes { name },
			)))
		}
		PromptKind::TaskMinutes { name } => {
			let minutes = parse_number(&prompt.input, "planned minutes")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Description (optional)",
				PromptKind::TaskDescription { name, minutes },
			)))
		}
		PromptKind::TaskDescription { name, minutes } => {
			let session = session.as_mut().ok_or("no active session")?;
			let description = optional_text(&prompt.input);
			session
				.add_task(&name, minutes, description)
				.map_err(|err| err.to_string())?;
			Ok(PromptOutcome::Done(format!("created task: {name}")))
		}
		PromptKind::EditTaskName { task_id } => {
			let name = required_text(&prompt.input, "task name")?;
			let current_minutes = session
				.as_ref()
				.and_then(|session| session.pending_task(&task_id))
				.map(|task| task.planned_minutes)
				.ok_or("task no longer exists")?;
			Ok(PromptOutcome::NextPrompt(PromptState::with_input(
				"Edit planned minutes",
				PromptKind::EditTaskMinutes { task_id, name },
				current_minutes.to_string(),
			)))
		}
		PromptKind::EditTaskMinutes { task_id, name } => {
			let minutes = parse_number(&prompt.input, "planned minutes")?;
			let current_description = session
				.as_ref()
				.and_then(|session| session.pending_task(&task_id))
				.and_then(|task| task.description.clone())
				.unwrap_or_default();
			Ok(PromptOutcome::NextPrompt(PromptState::with_input(
				"Edit description",
				PromptKind::EditTaskDescription {
					task_id,
					name,
					minutes,
				},
				current_description,
			)))
		}
		PromptKind::EditTaskDescription {
			task_id,
			name,
			minutes,
		} => {
			let session = session.as_mut().ok_or("no active session")?;
			session
				.edit_task(
					&task_id,
					TaskEdit {
						name: name.clone(),
						planned_minutes: minutes,
						description: optional_text(&prompt.input),
					},
				)
				.map_err(|err| err.to_string())?;
			Ok(PromptOutcome::Done(format!("updated task: {name}")))
		}
		PromptKind::ExportPath => {
			let session = session.as_ref().ok_or("no active session")?;
			let path = match optional_text(&prompt.input) {
				Some(raw) => PathBuf::from(raw),
				None => session_path.clone(),
			};
			export_session(session, session_path, path)
		}
		PromptKind::ImportPath => {
			let raw = required_text(&prompt.input, "file path")?;
			import_session(session, session_path, PathBuf::from(raw))
		}
	}
}

fn submit_select(
	select: SelectState,
	session: &mut Option<Session>,
	session_path: &mut PathBuf,
) -> Result<SelectOutcome, String> {
	let selected_value = select
		.selected_option()
		.map(|option| option.value.clone())
		.ok_or_else(|| "no option selected".to_string())?;

	match select.kind {
		SelectKind::RemoveTaskConfirm { task_id, task_name } => {
			let action = selected_value
				.as_deref()
				.ok_or_else(|| "selected action is missing".to_string())?;
			if action == "remove" {
				let session = session.as_mut().ok_or("no active session")?;
				let removed = session.remove_task(&task_id).map_err(|err| err.to_string())?;
				Ok(SelectOutcome::Done(format!(
					"removed task: {task_name}, released {} min",
					removed.planned_minutes
				)))
			} else {
				Ok(SelectOutcome::Done("Remove cancelled".to_string()))
			}
		}
		SelectKind::ImportSource => match selected_value {
			Some(path) => import_session(session, session_path, PathBuf::from(path))
				.map(prompt_outcome_to_select),
			None => Ok(SelectOutcome::NextPrompt(PromptState::new(
				"Session file to import",
				PromptKind::ImportPath,
			))),
		},
	}
}

fn prompt_outcome_to_select(outcome: PromptOutcome) -> SelectOutcome {
	match outcome {
		PromptOutcome::NextPrompt(prompt) => SelectOutcome::NextPrompt(prompt),
		PromptOutcome::Done(message) => SelectOutcome::Done(message),
	}
}

fn export_session(
	session: &Session,
	session_path: &mut PathBuf,
	path: PathBuf,
) -> Result<PromptOutcome, String> {
	save_session(&path, session).map_err(|err| err.to_string())?;
	*session_path = path;

	match remember_session_file(session_path.as_path()) {
		Ok(()) => Ok(PromptOutcome::Done(format!(
			"exported session to {}",
			session_path.display()
		))),
		Err(err) => Ok(PromptOutcome::Done(format!(
			"exported session to {} (warning: failed to store recents: {err})",
			session_path.display()
		))),
	}
}

fn import_session(
	session: &mut Option<Session>,
	session_path: &mut PathBuf,
	path: PathBuf,
) -> Result<PromptOutcome, String> {
	let loaded = load_session(&path).map_err(|err| err.to_string())?;
	*session = Some(loaded);
	*session_path = path;
	let _ = remember_session_file(session_path.as_path());

	// The file does not carry the plan total; it has to be re-declared.
	Ok(PromptOutcome::NextPrompt(PromptState::new(
		"Planned hours for this session",
		PromptKind::RevisePlanHours,
	)))
}

fn build_remove_confirm_select(task_id: String, task_name: String) -> SelectState {
	let title = format!("Remove task? {task_name}");
	let options = vec![
		SelectOption::new(
			"Remove",
			Some("remove".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new(
		title,
		SelectKind::RemoveTaskConfirm { task_id, task_name },
		options,
	);
	// Default to cancel to prevent accidental removals.
	select.selected = 1;
	select
}

fn build_import_select(current_path: &Path) -> Result<SelectState, String> {
	let catalog =
		SessionCatalog::load().map_err(|err| format!("failed to load recent sessions: {err}"))?;
	let mut paths = catalog
		.entries(20)
		.iter()
		.map(|entry| entry.path.clone())
		.collect::<Vec<_>>();
	let current_path = current_path.to_path_buf();
	if !paths.iter().any(|path| path == &current_path) && current_path.exists() {
		paths.insert(0, current_path);
	}

	let mut options = paths
		.into_iter()
		.map(|path| {
			let value = path.display().to_string();
			let exists = path.exists();
			let label = if exists {
				value.clone()
			} else {
				format!("[missing] {value}")
			};
			let style = if exists {
				Style::default()
			} else {
				Style::default().fg(Color::DarkGray)
			};
			SelectOption::new(label, Some(value), style)
		})
		.collect::<Vec<_>>();
	options.push(SelectOption::new("Type a path...", None, Style::default()));

	Ok(SelectState::new(
		"Import session",
		SelectKind::ImportSource,
		options,
	))
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		Err(format!("{field_name} is required"))
	} else {
		Ok(value.to_string())
	}
}

fn optional_text(input: &str) -> Option<String> {
	let value = input.trim();
	if value.is_empty() {
		None
	} else {
		Some(value.to_string())
	}
}

fn parse_number(input: &str, field_name: &str) -> Result<u32, String> {
	input
		.trim()
		.parse::<u32>()
		.map_err(|_| format!("{field_name} must be a whole number"))
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Done(String),
}

#[derive(Debug, Clone)]
enum SelectOutcome {
	NextPrompt(PromptState),
	Done(String),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}

	fn with_input(title: impl Into<String>, kind: PromptKind, input: String) -> Self {
		Self {
			title: title.into(),
			input,
			kind,
		}
	}
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: Option<String>,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: Option<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	OwnerName,
	PlannedHours {
		owner_name: String,
	},
	RevisePlanHours,
	TaskName,
	TaskMinutes {
		name: String,
	},
	TaskDescription {
		name: String,
		minutes: u32,
	},
	EditTaskName {
		task_id: String,
	},
	EditTaskMinutes {
		task_id: String,
		name: String,
	},
	EditTaskDescription {
		task_id: String,
		name: String,
		minutes: u32,
	},
	ExportPath,
	ImportPath,
}

#[derive(Debug, Clone)]
enum SelectKind {
	RemoveTaskConfirm { task_id: String, task_name: String },
	ImportSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusPane {
	Pending,
	Done,
}

impl FocusPane {
	fn other(self) -> Self {
		match self {
			FocusPane::Pending => FocusPane::Done,
			FocusPane::Done => FocusPane::Pending,
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
	Quote(QuoteView),
}

#[derive(Debug, Clone)]
struct QuoteView {
	quote: String,
	author: String,
}

#[derive(Debug, Clone)]
struct App {
	focus: FocusPane,
	pending_index: usize,
	done_index: usize,
	mode: InputMode,
	status: String,
}

impl Default for App {
	fn default() -> Self {
		Self {
			focus: FocusPane::Pending,
			pending_index: 0,
			done_index: 0,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}
}

impl App {
	fn clamp_selection(&mut self, session: &Option<Session>) {
		let (pending_len, done_len) = match session {
			Some(session) => (session.pending.len(), session.done.len()),
			None => (0, 0),
		};

		if pending_len == 0 {
			self.pending_index = 0;
		} else {
			self.pending_index = self.pending_index.min(pending_len - 1);
		}

		if done_len == 0 {
			self.done_index = 0;
		} else {
			self.done_index = self.done_index.min(done_len - 1);
		}
	}

	fn move_selection(&mut self, delta: i32, session: &Option<Session>) {
		let len = match (self.focus, session) {
			(FocusPane::Pending, Some(session)) => session.pending.len(),
			(FocusPane::Done, Some(session)) => session.done.len(),
			(_, None) => 0,
		};
		let index = match self.focus {
			FocusPane::Pending => &mut self.pending_index,
			FocusPane::Done => &mut self.done_index,
		};

		if len == 0 {
			*index = 0;
			return;
		}

		if delta > 0 {
			*index = (*index + delta as usize).min(len - 1);
		} else {
			*index = index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_pending_id(&self, session: &Session) -> Option<String> {
		session
			.pending
			.get(self.pending_index)
			.map(|task| task.id.clone())
	}
}
