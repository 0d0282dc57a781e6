//! Peer review aggregation.

use super::mean_one_decimal;
use crate::models::{Member, PeerReview, ReviewAverages, ReviewSummary};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Running sums for one receiver.
#[derive(Debug, Default)]
struct RatingTotals {
    quality: i64,
    communication: i64,
    timeliness: i64,
    initiative: i64,
    count: i64,
}

impl RatingTotals {
    fn add(&mut self, review: &PeerReview) {
        self.quality += i64::from(review.quality);
        self.communication += i64::from(review.communication);
        self.timeliness += i64::from(review.timeliness);
        self.initiative += i64::from(review.initiative);
        self.count += 1;
    }

    fn into_averages(self, name: String) -> ReviewAverages {
        ReviewAverages {
            name,
            avg_quality: mean_one_decimal(self.quality, self.count),
            avg_communication: mean_one_decimal(self.communication, self.count),
            avg_timeliness: mean_one_decimal(self.timeliness, self.count),
            avg_initiative: mean_one_decimal(self.initiative, self.count),
            review_count: self.count as usize,
        }
    }
}

/// Average the ratings each member received.
///
/// `reviews` must already hold at most one review per (giver, receiver)
/// pair, so the review count equals the number of distinct givers.
/// Names are looked up in `members`; a receiver who has left the project
/// is reported under their id. Ratings are not re-validated here.
pub fn summarize_reviews(reviews: &[PeerReview], members: &[Member]) -> ReviewSummary {
    let names: HashMap<&str, &str> = members
        .iter()
        .map(|m| (m.user_id.as_str(), m.name.as_str()))
        .collect();

    let mut totals: BTreeMap<&str, RatingTotals> = BTreeMap::new();
    for review in reviews {
        totals
            .entry(review.receiver_id.as_str())
            .or_default()
            .add(review);
    }

    debug!(
        "Aggregated {} reviews for {} receivers",
        reviews.len(),
        totals.len()
    );

    totals
        .into_iter()
        .map(|(receiver_id, sums)| {
            let name = names.get(receiver_id).copied().unwrap_or(receiver_id);
            (receiver_id.to_string(), sums.into_averages(name.to_string()))
        })
        .collect()
}

/// Overall rating a member received: the mean of all four criteria over
/// every review, rounded to one decimal.
pub fn overall_rating(reviews: &[PeerReview], receiver_id: &str) -> Option<f64> {
    let (sum, count) = reviews
        .iter()
        .filter(|r| r.receiver_id == receiver_id)
        .fold((0i64, 0i64), |(sum, count), r| {
            let total: i64 = r.ratings().iter().map(|v| i64::from(*v)).sum();
            (sum + total, count + 4)
        });

    if count == 0 {
        None
    } else {
        Some(mean_one_decimal(sum, count))
    }
}
