//! Pipeline wiring and report data assembly.
//!
//! `analyze` runs the scoring, review and flagging stages over one
//! snapshot; `assemble_payload` condenses the result into the structured
//! data handed to the narrative generator.

use super::anomaly::detect_anomalies;
use super::contribution::{compute_contribution_scores, TaskLists};
use super::reviews::{overall_rating, summarize_reviews};
use crate::models::{
    MemberSummary, ProjectAnalysis, ProjectSnapshot, ReportPayload, Task, TaskStatus, TaskStats,
};
use chrono::{DateTime, Utc};
use tracing::info;

/// Count tasks by status. A task is overdue when its due date is before
/// `as_of` and it is not done.
pub fn compute_task_stats(tasks: &[Task], as_of: DateTime<Utc>) -> TaskStats {
    let mut stats = TaskStats {
        total: tasks.len(),
        ..TaskStats::default()
    };

    for task in tasks {
        match task.status {
            TaskStatus::Todo => stats.todo += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::Done => stats.done += 1,
        }

        let past_due = task.due_date.is_some_and(|due| due < as_of);
        if past_due && task.status != TaskStatus::Done {
            stats.overdue += 1;
        }
    }

    stats
}

/// Run the full pipeline over a snapshot.
///
/// `as_of` is the reference instant for overdue tasks. Identical inputs
/// always produce identical output.
pub fn analyze(snapshot: &ProjectSnapshot, as_of: DateTime<Utc>) -> ProjectAnalysis {
    let lists = TaskLists::partition(&snapshot.tasks);

    let contributions = compute_contribution_scores(
        &snapshot.members,
        &snapshot.events,
        &lists.done,
        &lists.in_progress,
    );
    // One score per distinct member id
    let team_size = contributions.len();
    let review_summary = summarize_reviews(&snapshot.reviews, &snapshot.members);
    let flags = detect_anomalies(&contributions, &review_summary, team_size);
    let task_stats = compute_task_stats(&snapshot.tasks, as_of);

    info!(
        "Analyzed {}: {} members scored, {} reviewed, {} flags",
        snapshot.project.name,
        contributions.len(),
        review_summary.len(),
        flags.len()
    );

    ProjectAnalysis {
        team_size,
        task_stats,
        contributions,
        review_summary,
        flags,
    }
}

/// Build the narrative hand-off payload from a finished analysis.
pub fn assemble_payload(snapshot: &ProjectSnapshot, analysis: &ProjectAnalysis) -> ReportPayload {
    let members = analysis
        .contributions
        .iter()
        .map(|c| MemberSummary {
            user_id: c.user_id.clone(),
            name: c.name.clone(),
            contribution_percent: c.percentage,
            points: c.points,
            tasks_completed: c.breakdown.tasks_completed,
            tasks_created: c.breakdown.tasks_created,
            tasks_in_progress: c.breakdown.tasks_in_progress,
            peer_rating: overall_rating(&snapshot.reviews, &c.user_id),
        })
        .collect();

    ReportPayload {
        project: snapshot.project.clone(),
        team_size: analysis.team_size,
        task_stats: analysis.task_stats,
        members,
        contributions: analysis.contributions.clone(),
        review_summary: analysis.review_summary.clone(),
        flags: analysis.flags.clone(),
    }
}
