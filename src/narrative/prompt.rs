//! Prompt rendering for the narrative report.

use crate::models::ReportPayload;

/// System prompt sent ahead of the project data.
pub const SYSTEM_PROMPT: &str = r#"You are an academic project evaluator.
You write professional contribution reports for university group projects.
Be factual, fair, and concise. Use professional academic language.
Base every statement on the data provided; do not invent activity."#;

/// Render the user prompt from the assembled payload.
pub fn build_prompt(payload: &ReportPayload) -> String {
    let mut prompt = String::new();
    let stats = &payload.task_stats;

    prompt.push_str("Generate a professional contribution report for a university group project.\n\n");
    prompt.push_str(&format!("Project: \"{}\"\n", payload.project.name));
    prompt.push_str(&format!(
        "Course: {}\n",
        payload.project.course_code.as_deref().unwrap_or("N/A")
    ));
    prompt.push_str(&format!(
        "Total Tasks: {} ({} completed, {} in progress, {} overdue)\n",
        stats.total, stats.done, stats.in_progress, stats.overdue
    ));
    prompt.push_str(&format!("Team Size: {}\n", payload.team_size));

    prompt.push_str("\nMember Data:\n");
    for member in &payload.members {
        prompt.push_str(&format!("- {}:\n", member.name));
        prompt.push_str(&format!(
            "  Contribution: {}%\n",
            member.contribution_percent
        ));
        prompt.push_str(&format!("  Points: {}\n", member.points));
        prompt.push_str(&format!("  Tasks Completed: {}\n", member.tasks_completed));
        prompt.push_str(&format!(
            "  Tasks In Progress: {}\n",
            member.tasks_in_progress
        ));
        prompt.push_str(&format!("  Tasks Created: {}\n", member.tasks_created));
        match member.peer_rating {
            Some(rating) => prompt.push_str(&format!("  Peer Rating: {:.1}/5\n", rating)),
            None => prompt.push_str("  Peer Rating: No reviews yet\n"),
        }
    }

    prompt.push_str("\nFairness Flags:\n");
    if payload.flags.is_empty() {
        prompt.push_str("- None\n");
    } else {
        for flag in &payload.flags {
            prompt.push_str(&format!("- {}: {}\n", flag.subject_name, flag.reason));
        }
    }

    prompt.push_str(
        "\nWrite a professional report with:\n\
         1. A brief project summary\n\
         2. Individual contribution analysis for each member (2-3 sentences each)\n\
         3. Team dynamics observations\n\
         4. Suggested grading adjustment (e.g. +5%, -10%) based on contribution and peer scores\n\
         5. Any flags or concerns\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Flag, FlagReason, MemberSummary, ProjectInfo, ReviewSummary, TaskStats};

    fn payload() -> ReportPayload {
        ReportPayload {
            project: ProjectInfo {
                id: "p1".to_string(),
                name: "Orbit Planner".to_string(),
                course_code: None,
            },
            team_size: 2,
            task_stats: TaskStats {
                total: 6,
                todo: 1,
                in_progress: 2,
                done: 3,
                overdue: 1,
            },
            members: vec![
                MemberSummary {
                    user_id: "u1".to_string(),
                    name: "Ana".to_string(),
                    contribution_percent: 92,
                    points: 23,
                    tasks_completed: 3,
                    tasks_created: 4,
                    tasks_in_progress: 0,
                    peer_rating: Some(4.0),
                },
                MemberSummary {
                    user_id: "u2".to_string(),
                    name: "Ben".to_string(),
                    contribution_percent: 8,
                    points: 2,
                    tasks_completed: 0,
                    tasks_created: 1,
                    tasks_in_progress: 0,
                    peer_rating: None,
                },
            ],
            contributions: Vec::new(),
            review_summary: ReviewSummary::new(),
            flags: vec![Flag {
                user_id: "u2".to_string(),
                subject_name: "Ben".to_string(),
                reason: FlagReason::VeryLowContribution,
            }],
        }
    }

    #[test]
    fn test_prompt_contains_project_and_members() {
        let prompt = build_prompt(&payload());

        assert!(prompt.contains("Project: \"Orbit Planner\""));
        assert!(prompt.contains("Course: N/A"));
        assert!(prompt.contains("Total Tasks: 6 (3 completed, 2 in progress, 1 overdue)"));
        assert!(prompt.contains("Team Size: 2"));
        assert!(prompt.contains("Contribution: 92%"));
        assert!(prompt.contains("Peer Rating: 4.0/5"));
        assert!(prompt.contains("Peer Rating: No reviews yet"));
    }

    #[test]
    fn test_prompt_member_block_layout() {
        let prompt = build_prompt(&payload());

        assert!(prompt.contains(
            "- Ana:\n  Contribution: 92%\n  Points: 23\n  Tasks Completed: 3\n  Tasks In Progress: 0\n  Tasks Created: 4\n  Peer Rating: 4.0/5\n"
        ));
    }

    #[test]
    fn test_prompt_lists_flags() {
        let prompt = build_prompt(&payload());
        assert!(prompt.contains("- Ben: Very low contribution (<10%)"));

        let mut quiet = payload();
        quiet.flags.clear();
        assert!(build_prompt(&quiet).contains("Fairness Flags:\n- None"));
    }
}
