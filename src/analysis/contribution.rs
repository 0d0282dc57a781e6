//! Contribution scoring.
//!
//! Turns activity events and task states into weighted point totals,
//! a per-category breakdown and an integer share of the team total.

use super::div_round_half_up;
use crate::models::{
    ActivityEvent, Breakdown, ContributionScore, EventKind, Member, Task, TaskStatus,
};
use std::collections::HashMap;
use tracing::debug;

/// Points for creating a task.
pub const TASK_CREATED_POINTS: u32 = 2;
/// Points for inviting a member.
pub const MEMBER_INVITED_POINTS: u32 = 1;
/// Points for creating the project.
pub const PROJECT_CREATED_POINTS: u32 = 1;
/// Points for each done task, credited to the assignee.
pub const TASK_DONE_POINTS: u32 = 5;
/// Points for each in-progress task, credited to the assignee.
pub const TASK_IN_PROGRESS_POINTS: u32 = 3;

/// Which breakdown counter an activity feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    TasksCompleted,
    TasksInProgress,
    TasksCreated,
    OtherActions,
}

impl Bucket {
    fn bump(self, breakdown: &mut Breakdown) {
        match self {
            Bucket::TasksCompleted => breakdown.tasks_completed += 1,
            Bucket::TasksInProgress => breakdown.tasks_in_progress += 1,
            Bucket::TasksCreated => breakdown.tasks_created += 1,
            Bucket::OtherActions => breakdown.other_actions += 1,
        }
    }
}

/// Weight of an event kind, `None` for kinds that score nothing.
fn event_weight(kind: &EventKind) -> Option<(u32, Bucket)> {
    match kind {
        EventKind::TaskCreated => Some((TASK_CREATED_POINTS, Bucket::TasksCreated)),
        EventKind::MemberInvited => Some((MEMBER_INVITED_POINTS, Bucket::OtherActions)),
        EventKind::ProjectCreated => Some((PROJECT_CREATED_POINTS, Bucket::OtherActions)),
        EventKind::Other(_) => None,
    }
}

/// Done and in-progress tasks, the two lists that earn points.
#[derive(Debug, Clone, Default)]
pub struct TaskLists<'a> {
    pub done: Vec<&'a Task>,
    pub in_progress: Vec<&'a Task>,
}

impl<'a> TaskLists<'a> {
    /// Split a task board by status. Todo tasks are left out.
    pub fn partition(tasks: &'a [Task]) -> Self {
        let mut lists = Self::default();
        for task in tasks {
            match task.status {
                TaskStatus::Done => lists.done.push(task),
                TaskStatus::InProgress => lists.in_progress.push(task),
                TaskStatus::Todo => {}
            }
        }
        lists
    }
}

/// Per-member accumulator, indexed by position in the member list.
struct ScoreTable<'m> {
    index: HashMap<&'m str, usize>,
    rows: Vec<ContributionScore>,
}

impl<'m> ScoreTable<'m> {
    fn new(members: &'m [Member]) -> Self {
        let mut index = HashMap::with_capacity(members.len());
        let mut rows = Vec::with_capacity(members.len());

        for member in members {
            if index.contains_key(member.user_id.as_str()) {
                debug!("Duplicate member {} in member list", member.user_id);
                continue;
            }
            index.insert(member.user_id.as_str(), rows.len());
            rows.push(ContributionScore {
                user_id: member.user_id.clone(),
                name: member.name.clone(),
                points: 0,
                percentage: 0,
                breakdown: Breakdown::default(),
            });
        }

        Self { index, rows }
    }

    /// Credit a member. Unknown ids are ignored.
    fn credit(&mut self, user_id: &str, points: u32, bucket: Bucket) -> bool {
        match self.index.get(user_id) {
            Some(&i) => {
                let row = &mut self.rows[i];
                row.points += points;
                bucket.bump(&mut row.breakdown);
                true
            }
            None => false,
        }
    }

    fn credit_tasks(&mut self, tasks: &[&Task], points: u32, bucket: Bucket) -> usize {
        let mut skipped = 0;
        for task in tasks {
            let credited = task
                .assignee_id
                .as_deref()
                .map(|assignee| self.credit(assignee, points, bucket))
                .unwrap_or(false);
            if !credited {
                skipped += 1;
            }
        }
        skipped
    }

    fn finish(mut self) -> Vec<ContributionScore> {
        let total: u32 = self.rows.iter().map(|r| r.points).sum();

        for row in &mut self.rows {
            row.percentage = share_percentage(row.points, total);
        }

        // Stable: ties keep member order
        self.rows.sort_by(|a, b| b.points.cmp(&a.points));
        self.rows
    }
}

/// Integer percentage of `points` in `total`, 0 when the team has no points.
///
/// Each member is rounded on its own, so the shares may not add up to
/// exactly 100.
pub fn share_percentage(points: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    div_round_half_up(i64::from(points) * 100, i64::from(total)) as u32
}

/// Score every member from the activity log and the task board.
///
/// Events from actors outside `members` and tasks assigned to unknown or
/// missing assignees are skipped. The result holds exactly one entry per
/// member, sorted by points descending.
pub fn compute_contribution_scores(
    members: &[Member],
    events: &[ActivityEvent],
    done: &[&Task],
    in_progress: &[&Task],
) -> Vec<ContributionScore> {
    let mut table = ScoreTable::new(members);

    let mut stale_events = 0;
    for event in events {
        if let Some((points, bucket)) = event_weight(&event.kind) {
            if !table.credit(&event.actor_id, points, bucket) {
                stale_events += 1;
            }
        }
    }

    let unassigned_done = table.credit_tasks(done, TASK_DONE_POINTS, Bucket::TasksCompleted);
    let unassigned_active =
        table.credit_tasks(in_progress, TASK_IN_PROGRESS_POINTS, Bucket::TasksInProgress);

    debug!(
        "Scored {} members from {} events ({} from unknown actors), {} done and {} in-progress tasks ({} uncredited)",
        table.rows.len(),
        events.len(),
        stale_events,
        done.len(),
        in_progress.len(),
        unassigned_done + unassigned_active
    );

    table.finish()
}
