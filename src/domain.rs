use chrono::{DateTime, Local, Timelike, Utc};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

const ID_LEN: usize = 8;
const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    InvalidBudget,
    BudgetExceeded { requested: u32, available: i64 },
    InvalidTask(String),
    TaskNotFound(String),
    TaskRunning,
    TimerBusy,
    NotRunning,
}

impl std::fmt::Display for PlannerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlannerError::InvalidBudget => {
                write!(f, "planned minutes must be greater than zero")
            }
            PlannerError::BudgetExceeded {
                requested,
                available,
            } => write!(
                f,
                "not enough remaining planned time: requested {requested} min, available {available} min"
            ),
            PlannerError::InvalidTask(reason) => write!(f, "{reason}"),
            PlannerError::TaskNotFound(id) => write!(f, "task not found: {id}"),
            PlannerError::TaskRunning => write!(f, "task is running: stop it before changing it"),
            PlannerError::TimerBusy => write!(f, "a task is already running"),
            PlannerError::NotRunning => write!(f, "this task is not running"),
        }
    }
}

impl std::error::Error for PlannerError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub planned_minutes: u32,
    pub remaining_seconds: u32,
    pub description: Option<String>,
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub actual_used_minutes: u32,
}

impl Task {
    fn new(name: String, planned_minutes: u32, description: Option<String>) -> Self {
        Self {
            id: generate_id(),
            name,
            planned_minutes,
            remaining_seconds: planned_minutes.saturating_mul(60),
            description,
            running: false,
            started_at: None,
            completed_at: None,
            actual_used_minutes: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskEdit {
    pub name: String,
    pub planned_minutes: u32,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BudgetLedger {
    total_planned_minutes: u32,
    committed_minutes: u32,
}

impl BudgetLedger {
    pub fn new(total_minutes: u32) -> Result<Self, PlannerError> {
        if total_minutes == 0 {
            return Err(PlannerError::InvalidBudget);
        }

        Ok(Self {
            total_planned_minutes: total_minutes,
            committed_minutes: 0,
        })
    }

    pub(crate) fn empty() -> Self {
        Self {
            total_planned_minutes: 0,
            committed_minutes: 0,
        }
    }

    pub fn total_planned_minutes(&self) -> u32 {
        self.total_planned_minutes
    }

    pub fn committed_minutes(&self) -> u32 {
        self.committed_minutes
    }

    pub fn available_minutes(&self) -> i64 {
        i64::from(self.total_planned_minutes) - i64::from(self.committed_minutes)
    }

    pub fn try_commit(&mut self, minutes: u32) -> Result<(), PlannerError> {
        let available = self.available_minutes();
        if i64::from(minutes) > available {
            return Err(PlannerError::BudgetExceeded {
                requested: minutes,
                available,
            });
        }

        self.committed_minutes += minutes;
        Ok(())
    }

    pub fn release(&mut self, minutes: u32) {
        self.committed_minutes = self.committed_minutes.saturating_sub(minutes);
    }

    pub fn revise_plan(&mut self, new_total_minutes: u32) {
        self.total_planned_minutes = new_total_minutes;
    }

    pub(crate) fn commit_unchecked(&mut self, minutes: u32) {
        self.committed_minutes += minutes;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running { task_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Idle,
    Running {
        task_id: String,
        remaining_seconds: u32,
    },
    Expired {
        task_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct Session {
    pub owner_name: String,
    pub ledger: BudgetLedger,
    pub pending: Vec<Task>,
    pub done: Vec<Task>,
    pub timer: TimerState,
}

impl Session {
    pub fn new(owner_name: String, total_minutes: u32) -> Result<Self, PlannerError> {
        Ok(Self {
            owner_name,
            ledger: BudgetLedger::new(total_minutes)?,
            pending: Vec::new(),
            done: Vec::new(),
            timer: TimerState::Idle,
        })
    }

    pub(crate) fn restore(owner_name: String, pending: Vec<Task>, done: Vec<Task>) -> Self {
        let mut ledger = BudgetLedger::empty();
        for task in &pending {
            ledger.commit_unchecked(task.planned_minutes);
        }

        Self {
            owner_name,
            ledger,
            pending,
            done,
            timer: TimerState::Idle,
        }
    }

    pub fn pending_task(&self, task_id: &str) -> Option<&Task> {
        self.pending.iter().find(|task| task.id == task_id)
    }

    pub fn running_task(&self) -> Option<&Task> {
        match &self.timer {
            TimerState::Running { task_id } => self.pending_task(task_id),
            TimerState::Idle => None,
        }
    }

    pub fn available_minutes(&self) -> i64 {
        self.ledger.available_minutes()
    }

    pub fn revise_plan(&mut self, new_total_minutes: u32) {
        self.ledger.revise_plan(new_total_minutes);
    }

    pub fn pending_planned_minutes(&self) -> u32 {
        self.pending.iter().map(|task| task.planned_minutes).sum()
    }

    pub fn used_minutes_total(&self) -> u32 {
        self.done.iter().map(|task| task.actual_used_minutes).sum()
    }

    pub fn add_task(
        &mut self,
        name: &str,
        planned_minutes: u32,
        description: Option<String>,
    ) -> Result<String, PlannerError> {
        let name = validated_name(name)?;
        validated_minutes(planned_minutes)?;
        self.ledger.try_commit(planned_minutes)?;

        let task = Task::new(name, planned_minutes, normalized_description(description));
        let id = task.id.clone();
        self.pending.push(task);
        Ok(id)
    }

    pub fn edit_task(&mut self, task_id: &str, edit: TaskEdit) -> Result<(), PlannerError> {
        let index = self
            .pending_index(task_id)
            .ok_or_else(|| PlannerError::TaskNotFound(task_id.to_string()))?;
        if self.pending[index].running {
            return Err(PlannerError::TaskRunning);
        }

        let name = validated_name(&edit.name)?;
        validated_minutes(edit.planned_minutes)?;

        let old_minutes = self.pending[index].planned_minutes;
        if edit.planned_minutes > old_minutes {
            self.ledger.try_commit(edit.planned_minutes - old_minutes)?;
        } else {
            self.ledger.release(old_minutes - edit.planned_minutes);
        }

        let task = &mut self.pending[index];
        task.name = name;
        task.planned_minutes = edit.planned_minutes;
        task.description = normalized_description(edit.description);
        // The countdown restarts from the new full duration.
        task.remaining_seconds = edit.planned_minutes.saturating_mul(60);
        Ok(())
    }

    pub fn remove_task(&mut self, task_id: &str) -> Result<Task, PlannerError> {
        let index = self
            .pending_index(task_id)
            .ok_or_else(|| PlannerError::TaskNotFound(task_id.to_string()))?;
        if self.pending[index].running {
            return Err(PlannerError::TaskRunning);
        }

        let task = self.pending.remove(index);
        self.ledger.release(task.planned_minutes);
        Ok(task)
    }

    pub fn start_task(&mut self, task_id: &str, now: DateTime<Utc>) -> Result<(), PlannerError> {
        if let TimerState::Running { .. } = &self.timer {
            return Err(PlannerError::TimerBusy);
        }

        let index = self
            .pending_index(task_id)
            .ok_or_else(|| PlannerError::TaskNotFound(task_id.to_string()))?;

        let task = &mut self.pending[index];
        task.running = true;
        if task.started_at.is_none() {
            task.started_at = Some(now);
        }
        self.timer = TimerState::Running {
            task_id: task.id.clone(),
        };
        Ok(())
    }

    pub fn stop_task(&mut self, task_id: &str) -> Result<(), PlannerError> {
        match &self.timer {
            TimerState::Running { task_id: running } if running == task_id => {}
            _ => return Err(PlannerError::NotRunning),
        }

        let index = self
            .pending_index(task_id)
            .ok_or_else(|| PlannerError::TaskNotFound(task_id.to_string()))?;
        self.pending[index].running = false;
        self.timer = TimerState::Idle;
        Ok(())
    }

    pub fn tick(&mut self) -> Tick {
        let task_id = match &self.timer {
            TimerState::Running { task_id } => task_id.clone(),
            TimerState::Idle => return Tick::Idle,
        };

        let Some(index) = self.pending_index(&task_id) else {
            self.timer = TimerState::Idle;
            return Tick::Idle;
        };

        let task = &mut self.pending[index];
        if task.remaining_seconds > 0 {
            task.remaining_seconds -= 1;
            Tick::Running {
                task_id,
                remaining_seconds: task.remaining_seconds,
            }
        } else {
            task.running = false;
            self.timer = TimerState::Idle;
            Tick::Expired { task_id }
        }
    }

    pub fn complete_task(
        &mut self,
        task_id: &str,
        now: DateTime<Utc>,
    ) -> Result<&Task, PlannerError> {
        let index = self
            .pending_index(task_id)
            .ok_or_else(|| PlannerError::TaskNotFound(task_id.to_string()))?;

        if matches!(&self.timer, TimerState::Running { task_id: running } if running == task_id) {
            self.timer = TimerState::Idle;
        }

        let mut task = self.pending.remove(index);
        task.actual_used_minutes = match task.started_at {
            Some(started_at) => elapsed_whole_minutes(started_at, now),
            None => 0,
        };
        task.running = false;
        task.completed_at = Some(now);

        self.ledger
            .release(task.planned_minutes.saturating_sub(task.actual_used_minutes));
        self.done.push(task);
        Ok(self
            .done
            .last()
            .expect("completed task was just appended"))
    }

    fn pending_index(&self, task_id: &str) -> Option<usize> {
        self.pending.iter().position(|task| task.id == task_id)
    }
}

fn validated_name(name: &str) -> Result<String, PlannerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlannerError::InvalidTask("task name is required".to_string()));
    }
    Ok(name.to_string())
}

fn validated_minutes(planned_minutes: u32) -> Result<(), PlannerError> {
    if planned_minutes == 0 {
        return Err(PlannerError::InvalidTask(
            "planned minutes must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn normalized_description(description: Option<String>) -> Option<String> {
    let description = description?;
    let description = description.trim();
    if description.is_empty() {
        None
    } else {
        Some(description.to_string())
    }
}

fn elapsed_whole_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    let elapsed_ms = to.signed_duration_since(from).num_milliseconds().max(0);
    (elapsed_ms as f64 / 60_000.0).round() as u32
}

pub fn minutes_left_in_day(now: DateTime<Local>) -> u32 {
    MINUTES_PER_DAY - (now.hour() * 60 + now.minute())
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

pub fn format_countdown(total_seconds: u32) -> String {
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

pub fn format_plan_minutes(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let minutes = minutes.abs();
    format!("{sign}{}h {}min", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{
        PlannerError, Session, TaskEdit, Tick, TimerState, format_countdown, format_plan_minutes,
    };

    fn session_with_budget(total_minutes: u32) -> Session {
        Session::new("Lena".to_string(), total_minutes).expect("session should be created")
    }

    #[test]
    fn rejects_zero_budget() {
        let err = Session::new("Lena".to_string(), 0).expect_err("zero budget must be rejected");
        assert_eq!(err, PlannerError::InvalidBudget);
    }

    #[test]
    fn keeps_committed_minutes_within_plan() {
        let mut session = session_with_budget(60);
        session
            .add_task("Algebra", 30, None)
            .expect("first task should fit");
        session
            .add_task("Reading", 30, None)
            .expect("second task should fit");
        assert_eq!(session.available_minutes(), 0);

        let err = session
            .add_task("Extra", 1, None)
            .expect_err("over-budget task must be rejected");
        assert!(matches!(err, PlannerError::BudgetExceeded { .. }));
        assert_eq!(session.pending.len(), 2);
        assert_eq!(session.ledger.committed_minutes(), 60);
    }

    #[test]
    fn rejects_empty_name_and_zero_minutes() {
        let mut session = session_with_budget(60);
        assert!(matches!(
            session.add_task("   ", 10, None),
            Err(PlannerError::InvalidTask(_))
        ));
        assert!(matches!(
            session.add_task("Algebra", 0, None),
            Err(PlannerError::InvalidTask(_))
        ));
        assert!(session.pending.is_empty());
        assert_eq!(session.ledger.committed_minutes(), 0);
    }

    #[test]
    fn rejects_second_start_while_running() {
        let mut session = session_with_budget(60);
        let first = session
            .add_task("Algebra", 20, None)
            .expect("task should be created");
        let second = session
            .add_task("Reading", 20, None)
            .expect("task should be created");

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        session.start_task(&first, now).expect("start should work");
        let err = session
            .start_task(&second, now)
            .expect_err("second start must be rejected");
        assert_eq!(err, PlannerError::TimerBusy);
        assert_eq!(
            session.timer,
            TimerState::Running {
                task_id: first.clone()
            }
        );
        assert!(session.pending_task(&first).expect("first task").running);
        assert!(!session.pending_task(&second).expect("second task").running);
    }

    #[test]
    fn reconciles_wall_clock_for_running_completion() {
        let mut session = session_with_budget(60);
        let task_id = session
            .add_task("Algebra", 10, None)
            .expect("task should be created");

        let started = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        session
            .start_task(&task_id, started)
            .expect("start should work");

        let completed = session
            .complete_task(&task_id, started + Duration::minutes(6))
            .expect("complete should work");
        assert_eq!(completed.actual_used_minutes, 6);
        assert!(!completed.running);
        assert!(completed.completed_at.is_some());
        assert_eq!(session.timer, TimerState::Idle);
        // 10 planned - 6 used goes back to the budget.
        assert_eq!(session.ledger.committed_minutes(), 6);
        assert_eq!(session.available_minutes(), 54);
    }

    #[test]
    fn completes_never_started_task_with_zero_minutes() {
        let mut session = session_with_budget(60);
        let task_id = session
            .add_task("Reading", 15, Some("chapter 4".to_string()))
            .expect("task should be created");

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let completed = session
            .complete_task(&task_id, now)
            .expect("complete should work");
        assert_eq!(completed.actual_used_minutes, 0);
        assert_eq!(completed.remaining_seconds, 15 * 60);
        assert_eq!(completed.completed_at, Some(now));
        assert!(session.pending.is_empty());
        assert_eq!(session.done.len(), 1);
        assert_eq!(session.available_minutes(), 60);
    }

    #[test]
    fn keeps_first_start_across_stop_and_resume() {
        let mut session = session_with_budget(60);
        let task_id = session
            .add_task("Algebra", 30, None)
            .expect("task should be created");

        let first_start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        session
            .start_task(&task_id, first_start)
            .expect("start should work");
        session.stop_task(&task_id).expect("stop should work");
        session
            .start_task(&task_id, first_start + Duration::minutes(10))
            .expect("resume should work");
        session.stop_task(&task_id).expect("stop should work");

        let completed = session
            .complete_task(&task_id, first_start + Duration::minutes(15))
            .expect("complete should work");
        assert_eq!(completed.actual_used_minutes, 15);
    }

    #[test]
    fn stop_requires_the_matching_running_task() {
        let mut session = session_with_budget(60);
        let first = session
            .add_task("Algebra", 20, None)
            .expect("task should be created");
        let second = session
            .add_task("Reading", 20, None)
            .expect("task should be created");

        assert_eq!(session.stop_task(&first), Err(PlannerError::NotRunning));

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        session.start_task(&first, now).expect("start should work");
        assert_eq!(session.stop_task(&second), Err(PlannerError::NotRunning));
        session.stop_task(&first).expect("stop should work");
        assert_eq!(session.timer, TimerState::Idle);
    }

    #[test]
    fn expires_naturally_and_stays_pending() {
        let mut session = session_with_budget(60);
        let task_id = session
            .add_task("Sprint", 1, None)
            .expect("task should be created");

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        session
            .start_task(&task_id, now)
            .expect("start should work");

        for remaining in (0..60).rev() {
            assert_eq!(
                session.tick(),
                Tick::Running {
                    task_id: task_id.clone(),
                    remaining_seconds: remaining,
                }
            );
        }
        assert_eq!(
            session.tick(),
            Tick::Expired {
                task_id: task_id.clone()
            }
        );

        let task = session.pending_task(&task_id).expect("task stays pending");
        assert!(!task.running);
        assert_eq!(task.remaining_seconds, 0);
        assert_eq!(session.timer, TimerState::Idle);
        assert_eq!(session.tick(), Tick::Idle);

        let completed = session
            .complete_task(&task_id, now + Duration::minutes(2))
            .expect("explicit completion should still work");
        assert_eq!(completed.actual_used_minutes, 2);
    }

    #[test]
    fn rejects_edit_while_running() {
        let mut session = session_with_budget(60);
        let task_id = session
            .add_task("Algebra", 20, None)
            .expect("task should be created");
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        session
            .start_task(&task_id, now)
            .expect("start should work");

        let err = session
            .edit_task(
                &task_id,
                TaskEdit {
                    name: "Algebra II".to_string(),
                    planned_minutes: 25,
                    description: None,
                },
            )
            .expect_err("editing a running task must fail");
        assert_eq!(err, PlannerError::TaskRunning);

        let task = session.pending_task(&task_id).expect("task");
        assert_eq!(task.name, "Algebra");
        assert_eq!(task.planned_minutes, 20);
        assert_eq!(task.remaining_seconds, 20 * 60);
        assert!(task.running);
    }

    #[test]
    fn edit_resets_countdown_and_rebalances_budget() {
        let mut session = session_with_budget(60);
        let task_id = session
            .add_task("Algebra", 20, None)
            .expect("task should be created");

        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        session.start_task(&task_id, now).expect("start should work");
        for _ in 0..30 {
            session.tick();
        }
        session.stop_task(&task_id).expect("stop should work");

        session
            .edit_task(
                &task_id,
                TaskEdit {
                    name: "Algebra II".to_string(),
                    planned_minutes: 40,
                    description: Some("  homework  ".to_string()),
                },
            )
            .expect("edit should work");

        let task = session.pending_task(&task_id).expect("task");
        assert_eq!(task.name, "Algebra II");
        assert_eq!(task.planned_minutes, 40);
        assert_eq!(task.remaining_seconds, 40 * 60);
        assert_eq!(task.description.as_deref(), Some("homework"));
        assert_eq!(session.ledger.committed_minutes(), 40);

        let err = session
            .edit_task(
                &task_id,
                TaskEdit {
                    name: "Algebra II".to_string(),
                    planned_minutes: 61,
                    description: None,
                },
            )
            .expect_err("edit beyond the plan must fail");
        assert!(matches!(err, PlannerError::BudgetExceeded { .. }));
        let task = session.pending_task(&task_id).expect("task");
        assert_eq!(task.planned_minutes, 40);
    }

    #[test]
    fn revise_plan_can_undercut_commitments() {
        let mut session = session_with_budget(120);
        session
            .add_task("Algebra", 90, None)
            .expect("task should be created");

        session.revise_plan(60);
        assert_eq!(session.available_minutes(), -30);
        assert!(matches!(
            session.add_task("Reading", 1, None),
            Err(PlannerError::BudgetExceeded { .. })
        ));

        session.revise_plan(120);
        session
            .add_task("Reading", 30, None)
            .expect("task fits again after revising upward");
    }

    #[test]
    fn remove_releases_planned_minutes() {
        let mut session = session_with_budget(60);
        let task_id = session
            .add_task("Algebra", 45, None)
            .expect("task should be created");
        assert_eq!(session.available_minutes(), 15);

        let removed = session.remove_task(&task_id).expect("remove should work");
        assert_eq!(removed.planned_minutes, 45);
        assert!(session.pending.is_empty());
        assert_eq!(session.available_minutes(), 60);
    }

    #[test]
    fn formats_countdown_and_plan() {
        assert_eq!(format_countdown(65), "1:05");
        assert_eq!(format_countdown(600), "10:00");
        assert_eq!(format_plan_minutes(200), "3h 20min");
        assert_eq!(format_plan_minutes(-30), "-0h 30min");
    }
}
