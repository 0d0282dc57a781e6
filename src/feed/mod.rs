//! Project feed loading.
//!
//! A feed is a read-only snapshot of one project: either a single JSON
//! document, or a directory holding one JSON file per collection. The
//! directory form is read concurrently. Peer reviews are normalized here
//! (upsert per giver/receiver pair, self-reviews and out-of-range ratings
//! dropped) so the aggregators only ever see valid input.

use crate::models::{ActivityEvent, Member, PeerReview, ProjectInfo, ProjectSnapshot, Task};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const PROJECT_FILE: &str = "project.json";
pub const MEMBERS_FILE: &str = "members.json";
pub const EVENTS_FILE: &str = "events.json";
pub const TASKS_FILE: &str = "tasks.json";
pub const REVIEWS_FILE: &str = "reviews.json";

/// Errors raised while reading a snapshot.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("snapshot path does not exist: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Load a snapshot from a JSON file or a snapshot directory.
pub async fn load_snapshot(path: &Path) -> Result<ProjectSnapshot, FeedError> {
    if !path.exists() {
        return Err(FeedError::NotFound(path.display().to_string()));
    }

    let snapshot = if path.is_dir() {
        let mut snapshot = load_directory(path).await?;
        snapshot.reviews = normalize_reviews(std::mem::take(&mut snapshot.reviews));
        snapshot
    } else {
        let content = read_file(path).await?;
        parse_snapshot(&content, &path.display().to_string())?
    };

    info!(
        "Loaded snapshot for '{}': {} members, {} events, {} tasks, {} reviews",
        snapshot.project.name,
        snapshot.members.len(),
        snapshot.events.len(),
        snapshot.tasks.len(),
        snapshot.reviews.len()
    );

    Ok(snapshot)
}

/// Parse a single-document snapshot and normalize its reviews.
///
/// `origin` names the source in parse errors.
pub fn parse_snapshot(content: &str, origin: &str) -> Result<ProjectSnapshot, FeedError> {
    let mut snapshot: ProjectSnapshot =
        serde_json::from_str(content).map_err(|source| FeedError::Parse {
            path: origin.to_string(),
            source,
        })?;
    snapshot.reviews = normalize_reviews(std::mem::take(&mut snapshot.reviews));
    Ok(snapshot)
}

/// Read the per-collection files of a snapshot directory concurrently.
async fn load_directory(dir: &Path) -> Result<ProjectSnapshot, FeedError> {
    debug!("Reading snapshot directory: {}", dir.display());

    let (project, members, events, tasks, reviews) = futures::try_join!(
        read_json::<ProjectInfo>(dir.join(PROJECT_FILE)),
        read_json::<Vec<Member>>(dir.join(MEMBERS_FILE)),
        read_json_or_default::<Vec<ActivityEvent>>(dir.join(EVENTS_FILE)),
        read_json_or_default::<Vec<Task>>(dir.join(TASKS_FILE)),
        read_json_or_default::<Vec<PeerReview>>(dir.join(REVIEWS_FILE)),
    )?;

    Ok(ProjectSnapshot {
        project,
        members,
        events,
        tasks,
        reviews,
    })
}

async fn read_file(path: &Path) -> Result<String, FeedError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FeedError::Io {
            path: path.display().to_string(),
            source,
        })
}

fn parse_json<T: DeserializeOwned>(content: &str, path: &Path) -> Result<T, FeedError> {
    serde_json::from_str(content).map_err(|source| FeedError::Parse {
        path: path.display().to_string(),
        source,
    })
}

async fn read_json<T: DeserializeOwned>(path: PathBuf) -> Result<T, FeedError> {
    let content = read_file(&path).await?;
    parse_json(&content, &path)
}

/// Like `read_json`, but a missing file yields an empty collection.
async fn read_json_or_default<T: DeserializeOwned + Default>(
    path: PathBuf,
) -> Result<T, FeedError> {
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => parse_json(&content, &path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} not present, treating as empty", path.display());
            Ok(T::default())
        }
        Err(source) => Err(FeedError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Apply review submission rules to a raw review list.
///
/// - self-reviews are dropped
/// - reviews with any rating outside `1..=5` are dropped
/// - a later review for the same (giver, receiver) pair replaces the
///   earlier one and takes its place at the later position
pub fn normalize_reviews(reviews: Vec<PeerReview>) -> Vec<PeerReview> {
    let mut slots: Vec<Option<PeerReview>> = Vec::with_capacity(reviews.len());
    let mut latest: HashMap<(String, String), usize> = HashMap::new();

    for review in reviews {
        if review.is_self_review() {
            warn!("Dropping self-review by {}", review.giver_id);
            continue;
        }
        if !review.has_valid_ratings() {
            warn!(
                "Dropping review {} -> {} with ratings outside 1..=5: {:?}",
                review.giver_id,
                review.receiver_id,
                review.ratings()
            );
            continue;
        }

        let key = (review.giver_id.clone(), review.receiver_id.clone());
        if let Some(previous) = latest.insert(key, slots.len()) {
            debug!(
                "Review {} -> {} replaced by a later submission",
                review.giver_id, review.receiver_id
            );
            slots[previous] = None;
        }
        slots.push(Some(review));
    }

    slots.into_iter().flatten().collect()
}
