//! Data models for contribution scoring.
//!
//! This module contains the records read from the project feed
//! (members, activity events, tasks, peer reviews) and the derived
//! structures produced by the analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Basic project information carried alongside the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    /// Project identifier.
    pub id: String,
    /// Human-readable project name.
    pub name: String,
    /// Course code the project belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
}

/// A current member of the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// User identifier.
    pub user_id: String,
    /// Display name.
    #[serde(alias = "displayName")]
    pub name: String,
}

impl Member {
    #[allow(dead_code)] // Test and fixture helper
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
        }
    }
}

/// Category of an activity-log entry.
///
/// The store treats this as an open string enum. Kinds that carry no
/// weight are kept in `Other` so they survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    TaskCreated,
    MemberInvited,
    ProjectCreated,
    Other(String),
}

impl EventKind {
    /// Wire representation used by the activity log.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::TaskCreated => "TASK_CREATED",
            EventKind::MemberInvited => "MEMBER_INVITED",
            EventKind::ProjectCreated => "PROJECT_CREATED",
            EventKind::Other(s) => s,
        }
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "TASK_CREATED" => EventKind::TaskCreated,
            "MEMBER_INVITED" => EventKind::MemberInvited,
            "PROJECT_CREATED" => EventKind::ProjectCreated,
            _ => EventKind::Other(s),
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        EventKind::from(s.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// A single entry of the project's activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    /// Member who performed the action.
    #[serde(alias = "userId")]
    pub actor_id: String,
    /// What happened.
    #[serde(alias = "action")]
    pub kind: EventKind,
    /// When it happened.
    #[serde(alias = "createdAt")]
    pub timestamp: DateTime<Utc>,
    /// Free-form payload attached by the writer.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

/// A task on the project board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub assignee_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// One member's rating of another across the four review criteria.
///
/// Ratings are expected in `1..=5`; the feed drops anything else before
/// it reaches the aggregators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerReview {
    pub giver_id: String,
    pub receiver_id: String,
    pub quality: i32,
    pub communication: i32,
    pub timeliness: i32,
    pub initiative: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl PeerReview {
    /// The four ratings in criterion order.
    pub fn ratings(&self) -> [i32; 4] {
        [
            self.quality,
            self.communication,
            self.timeliness,
            self.initiative,
        ]
    }

    /// Whether every rating lies in the accepted `1..=5` domain.
    pub fn has_valid_ratings(&self) -> bool {
        self.ratings().iter().all(|r| (1..=5).contains(r))
    }

    pub fn is_self_review(&self) -> bool {
        self.giver_id == self.receiver_id
    }
}

/// Everything the feed supplies for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub project: ProjectInfo,
    pub members: Vec<Member>,
    #[serde(default)]
    pub events: Vec<ActivityEvent>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub reviews: Vec<PeerReview>,
}

/// Per-category counters behind a contribution score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub tasks_completed: u32,
    pub tasks_in_progress: u32,
    pub tasks_created: u32,
    pub other_actions: u32,
}

/// A member's weighted activity total and share of the team total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionScore {
    pub user_id: String,
    pub name: String,
    pub points: u32,
    /// Integer share of the team's points, rounded per member.
    pub percentage: u32,
    pub breakdown: Breakdown,
}

/// Averaged peer ratings received by one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAverages {
    pub name: String,
    pub avg_quality: f64,
    pub avg_communication: f64,
    pub avg_timeliness: f64,
    pub avg_initiative: f64,
    pub review_count: usize,
}

impl ReviewAverages {
    /// Sum of the four criterion averages, in tenths.
    ///
    /// Each average is stored with one decimal, so this is exact.
    pub fn criteria_sum_tenths(&self) -> i64 {
        [
            self.avg_quality,
            self.avg_communication,
            self.avg_timeliness,
            self.avg_initiative,
        ]
        .iter()
        .map(|avg| (avg * 10.0).round() as i64)
        .sum()
    }

    /// Mean of the four criterion averages.
    pub fn peer_score(&self) -> f64 {
        self.criteria_sum_tenths() as f64 / 40.0
    }
}

/// Review averages keyed by receiver id.
///
/// A member with no reviews has no entry.
pub type ReviewSummary = BTreeMap<String, ReviewAverages>;

/// Why a member was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagReason {
    #[serde(rename = "Very low contribution (<10%)")]
    VeryLowContribution,
    #[serde(rename = "High peer rating but low activity")]
    HighRatingLowActivity,
    #[serde(rename = "Low peer rating but high activity")]
    LowRatingHighActivity,
}

impl FlagReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagReason::VeryLowContribution => "Very low contribution (<10%)",
            FlagReason::HighRatingLowActivity => "High peer rating but low activity",
            FlagReason::LowRatingHighActivity => "Low peer rating but high activity",
        }
    }

    /// Returns an emoji representation of the flag.
    pub fn emoji(&self) -> &'static str {
        match self {
            FlagReason::VeryLowContribution => "🔻",
            FlagReason::HighRatingLowActivity => "🔼",
            FlagReason::LowRatingHighActivity => "⚠️",
        }
    }
}

impl fmt::Display for FlagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fairness signal raised against one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    pub user_id: String,
    pub subject_name: String,
    #[serde(rename = "reasonCode")]
    pub reason: FlagReason,
}

/// Task board counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
    /// Tasks past their due date that are not done.
    pub overdue: usize,
}

/// Output of one full pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAnalysis {
    pub team_size: usize,
    pub task_stats: TaskStats,
    pub contributions: Vec<ContributionScore>,
    pub review_summary: ReviewSummary,
    pub flags: Vec<Flag>,
}

/// Condensed per-member figures for the narrative prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub user_id: String,
    pub name: String,
    pub contribution_percent: u32,
    pub points: u32,
    pub tasks_completed: u32,
    pub tasks_created: u32,
    pub tasks_in_progress: u32,
    /// Overall peer rating out of 5, `None` when nobody reviewed the member.
    pub peer_rating: Option<f64>,
}

/// Structured data handed to the narrative generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    pub project: ProjectInfo,
    pub team_size: usize,
    pub task_stats: TaskStats,
    pub members: Vec<MemberSummary>,
    pub contributions: Vec<ContributionScore>,
    pub review_summary: ReviewSummary,
    pub flags: Vec<Flag>,
}

/// Metadata about the generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub project_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    /// Where the snapshot was read from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub team_size: usize,
    /// Model that wrote the narrative, if one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    pub duration_seconds: f64,
}

/// The complete contribution report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub metadata: ReportMetadata,
    pub payload: ReportPayload,
    /// Prose written by the narrative collaborator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}
