//! Fairness flagging.
//!
//! Cross-checks activity shares against peer ratings and raises flags for
//! members whose numbers look out of line with the rest of the team.

use crate::models::{ContributionScore, Flag, FlagReason, ReviewSummary};
use tracing::debug;

/// Shares strictly below this are a very low contribution.
pub const LOW_SHARE_PERCENT: u32 = 10;
/// Shares strictly below this count as low activity for a highly rated member.
pub const HIGH_RATING_LOW_SHARE_PERCENT: u32 = 15;
/// Shares strictly above this count as high activity for a poorly rated member.
pub const LOW_RATING_HIGH_SHARE_PERCENT: u32 = 40;

/// Peer score thresholds as sums of the four criterion averages, in tenths.
/// An average of 4.5 sums to 180, an average of 2.0 sums to 80.
const HIGH_RATING_SUM_TENTHS: i64 = 180;
const LOW_RATING_SUM_TENTHS: i64 = 80;

/// Raise fairness flags for each scored member.
///
/// Rules are checked independently, so one member can collect several
/// flags. Flags follow the order of `scores`, and within a member the
/// order of the rules. Members with no review entry are only checked
/// against the low contribution rule.
pub fn detect_anomalies(
    scores: &[ContributionScore],
    reviews: &ReviewSummary,
    team_size: usize,
) -> Vec<Flag> {
    let mut flags = Vec::new();

    for score in scores {
        let rating_sum = reviews
            .get(&score.user_id)
            .map(|r| r.criteria_sum_tenths());

        let mut raise = |reason: FlagReason| {
            flags.push(Flag {
                user_id: score.user_id.clone(),
                subject_name: score.name.clone(),
                reason,
            });
        };

        if score.percentage < LOW_SHARE_PERCENT && team_size > 1 {
            raise(FlagReason::VeryLowContribution);
        }

        if let Some(sum) = rating_sum {
            if sum >= HIGH_RATING_SUM_TENTHS && score.percentage < HIGH_RATING_LOW_SHARE_PERCENT {
                raise(FlagReason::HighRatingLowActivity);
            }
            if sum <= LOW_RATING_SUM_TENTHS && score.percentage > LOW_RATING_HIGH_SHARE_PERCENT {
                raise(FlagReason::LowRatingHighActivity);
            }
        }
    }

    debug!("Raised {} flags across {} members", flags.len(), scores.len());
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Breakdown, ReviewAverages};

    fn score(user_id: &str, name: &str, percentage: u32) -> ContributionScore {
        ContributionScore {
            user_id: user_id.to_string(),
            name: name.to_string(),
            points: percentage,
            percentage,
            breakdown: Breakdown::default(),
        }
    }

    fn averages(name: &str, q: f64, c: f64, t: f64, i: f64) -> ReviewAverages {
        ReviewAverages {
            name: name.to_string(),
            avg_quality: q,
            avg_communication: c,
            avg_timeliness: t,
            avg_initiative: i,
            review_count: 2,
        }
    }

    fn reasons(flags: &[Flag], user_id: &str) -> Vec<FlagReason> {
        flags
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.reason)
            .collect()
    }

    #[test]
    fn test_very_low_contribution() {
        let scores = vec![score("u1", "Ana", 60), score("u2", "Ben", 35), score("u3", "Cleo", 5)];

        let flags = detect_anomalies(&scores, &ReviewSummary::new(), 3);

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].subject_name, "Cleo");
        assert_eq!(flags[0].reason, FlagReason::VeryLowContribution);
    }

    #[test]
    fn test_single_member_team_is_never_low() {
        let scores = vec![score("u1", "Ana", 0)];

        let flags = detect_anomalies(&scores, &ReviewSummary::new(), 1);

        assert!(flags.is_empty());
    }

    #[test]
    fn test_high_rating_low_activity_only() {
        let scores = vec![score("u1", "Ana", 88), score("u2", "Ben", 12)];
        let mut reviews = ReviewSummary::new();
        reviews.insert("u2".to_string(), averages("Ben", 5.0, 4.5, 4.5, 5.0));

        let flags = detect_anomalies(&scores, &reviews, 2);

        assert_eq!(reasons(&flags, "u2"), vec![FlagReason::HighRatingLowActivity]);
        assert!(reasons(&flags, "u1").is_empty());
    }

    #[test]
    fn test_high_rating_threshold_is_inclusive() {
        let scores = vec![score("u1", "Ana", 86), score("u2", "Ben", 14)];
        let mut reviews = ReviewSummary::new();
        reviews.insert("u2".to_string(), averages("Ben", 4.6, 4.4, 4.5, 4.5));

        let flags = detect_anomalies(&scores, &reviews, 2);

        assert_eq!(reasons(&flags, "u2"), vec![FlagReason::HighRatingLowActivity]);
    }

    #[test]
    fn test_low_rating_high_activity() {
        let scores = vec![score("u1", "Ana", 55), score("u2", "Ben", 45)];
        let mut reviews = ReviewSummary::new();
        reviews.insert("u1".to_string(), averages("Ana", 1.0, 2.0, 1.5, 1.5));

        let flags = detect_anomalies(&scores, &reviews, 2);

        assert_eq!(reasons(&flags, "u1"), vec![FlagReason::LowRatingHighActivity]);
        assert!(reasons(&flags, "u2").is_empty());
    }

    #[test]
    fn test_low_rating_threshold_is_inclusive() {
        let scores = vec![score("u1", "Ana", 41)];
        let mut reviews = ReviewSummary::new();
        reviews.insert("u1".to_string(), averages("Ana", 2.0, 2.0, 2.0, 2.0));

        let flags = detect_anomalies(&scores, &reviews, 1);

        assert_eq!(reasons(&flags, "u1"), vec![FlagReason::LowRatingHighActivity]);
    }

    #[test]
    fn test_rules_are_not_exclusive() {
        let scores = vec![score("u1", "Ana", 95), score("u2", "Ben", 5)];
        let mut reviews = ReviewSummary::new();
        reviews.insert("u2".to_string(), averages("Ben", 5.0, 5.0, 5.0, 5.0));

        let flags = detect_anomalies(&scores, &reviews, 2);

        assert_eq!(
            reasons(&flags, "u2"),
            vec![
                FlagReason::VeryLowContribution,
                FlagReason::HighRatingLowActivity
            ]
        );
    }

    #[test]
    fn test_unrated_member_is_exempt_from_rating_rules() {
        let scores = vec![score("u1", "Ana", 90), score("u2", "Ben", 12)];

        let flags = detect_anomalies(&scores, &ReviewSummary::new(), 2);

        assert!(flags.is_empty());
    }

    #[test]
    fn test_flags_follow_score_order() {
        let scores = vec![
            score("u1", "Ana", 82),
            score("u2", "Ben", 9),
            score("u3", "Cleo", 9),
        ];

        let flags = detect_anomalies(&scores, &ReviewSummary::new(), 3);
        let names: Vec<&str> = flags.iter().map(|f| f.subject_name.as_str()).collect();

        assert_eq!(names, vec!["Ben", "Cleo"]);
    }
}
