//! Markdown report generation.
//!
//! This module generates Markdown and JSON contribution reports from the
//! assembled analysis.

use crate::config::ReportConfig;
use crate::models::{
    ContributionScore, Flag, Report, ReportMetadata, ReviewSummary, TaskStats,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, options: &ReportConfig) -> String {
    let payload = &report.payload;
    let mut output = String::new();

    output.push_str(&format!("# Contribution Report: {}\n\n", payload.project.name));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report, options));
    output.push_str(&generate_task_section(&payload.task_stats));
    output.push_str(&generate_contribution_section(
        &payload.contributions,
        options.include_breakdown,
    ));

    if options.include_reviews {
        output.push_str(&generate_reviews_section(&payload.review_summary));
    }

    output.push_str(&generate_flags_section(&payload.flags));

    if let Some(ref narrative) = report.narrative {
        output.push_str(&generate_narrative_section(narrative));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Project:** {}\n", metadata.project_name));
    if let Some(ref course) = metadata.course_code {
        section.push_str(&format!("- **Course:** {}\n", course));
    }
    section.push_str(&format!("- **Snapshot:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Team Size:** {}\n", metadata.team_size));
    if let Some(ref model) = metadata.model_used {
        section.push_str(&format!("- **Narrative Model:** `{}`\n", model));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report, options: &ReportConfig) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Tasks](#tasks)\n");
    toc.push_str("- [Contributions](#contributions)\n");
    if options.include_reviews {
        toc.push_str("- [Peer Reviews](#peer-reviews)\n");
    }
    toc.push_str("- [Flags](#flags)\n");
    if report.narrative.is_some() {
        toc.push_str("- [Evaluator Narrative](#evaluator-narrative)\n");
    }
    toc.push('\n');

    toc
}

/// Generate the task statistics section.
fn generate_task_section(stats: &TaskStats) -> String {
    let mut section = String::new();

    section.push_str("## Tasks\n\n");
    section.push_str("| To do | In progress | Done | Overdue | **Total** |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | **{}** |\n\n",
        stats.todo, stats.in_progress, stats.done, stats.overdue, stats.total
    ));

    section
}

/// Generate the contribution table.
fn generate_contribution_section(scores: &[ContributionScore], include_breakdown: bool) -> String {
    let mut section = String::new();

    section.push_str("## Contributions\n\n");

    if scores.is_empty() {
        section.push_str("This project has no members.\n\n");
        return section;
    }

    if include_breakdown {
        section.push_str(
            "| # | Member | Points | Share | Completed | In progress | Created | Other |\n",
        );
        section.push_str("|:---:|:---|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    } else {
        section.push_str("| # | Member | Points | Share |\n");
        section.push_str("|:---:|:---|:---:|:---:|\n");
    }

    for (rank, score) in scores.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} | {}% ",
            rank + 1,
            escape_cell(&score.name),
            score.points,
            score.percentage
        ));
        if include_breakdown {
            let b = &score.breakdown;
            section.push_str(&format!(
                "| {} | {} | {} | {} ",
                b.tasks_completed, b.tasks_in_progress, b.tasks_created, b.other_actions
            ));
        }
        section.push_str("|\n");
    }
    section.push('\n');

    let total: u32 = scores.iter().map(|s| s.percentage).sum();
    if total != 0 && total != 100 {
        section.push_str(&format!(
            "*Shares are rounded per member and add up to {}%.*\n\n",
            total
        ));
    }

    section
}

/// Generate the peer review table.
fn generate_reviews_section(summary: &ReviewSummary) -> String {
    let mut section = String::new();

    section.push_str("## Peer Reviews\n\n");

    if summary.is_empty() {
        section.push_str("No peer reviews have been submitted.\n\n");
        return section;
    }

    section.push_str("| Member | Quality | Communication | Timeliness | Initiative | Overall | Reviews |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|:---:|\n");

    for averages in summary.values() {
        section.push_str(&format!(
            "| {} | {:.1} | {:.1} | {:.1} | {:.1} | {:.2} | {} |\n",
            escape_cell(&averages.name),
            averages.avg_quality,
            averages.avg_communication,
            averages.avg_timeliness,
            averages.avg_initiative,
            averages.peer_score(),
            averages.review_count
        ));
    }
    section.push('\n');

    section
}

/// Generate the flags section.
fn generate_flags_section(flags: &[Flag]) -> String {
    let mut section = String::new();

    section.push_str("## Flags\n\n");

    if flags.is_empty() {
        section.push_str("No fairness flags raised.\n\n");
        return section;
    }

    for flag in flags {
        section.push_str(&format!(
            "- {} **{}**: {}\n",
            flag.reason.emoji(),
            flag.subject_name,
            flag.reason
        ));
    }
    section.push('\n');

    section
}

/// Generate the narrative section.
fn generate_narrative_section(narrative: &str) -> String {
    let mut section = String::new();

    section.push_str("## Evaluator Narrative\n\n");
    section.push_str(narrative.trim());
    section.push_str("\n\n");

    section
}

/// Escape text placed inside a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by teamscore*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Breakdown, FlagReason, MemberSummary, ProjectInfo, ReportPayload, ReviewAverages,
    };
    use chrono::Utc;

    fn create_test_report() -> Report {
        let metadata = ReportMetadata {
            project_name: "Orbit Planner".to_string(),
            course_code: Some("CS 3100".to_string()),
            source: "fixtures/project_snapshot.json".to_string(),
            generated_at: Utc::now(),
            team_size: 3,
            model_used: None,
            duration_seconds: 0.01,
        };

        let contributions = vec![
            ContributionScore {
                user_id: "u1".to_string(),
                name: "Ana".to_string(),
                points: 10,
                percentage: 33,
                breakdown: Breakdown {
                    tasks_completed: 1,
                    tasks_in_progress: 1,
                    tasks_created: 1,
                    other_actions: 0,
                },
            },
            ContributionScore {
                user_id: "u2".to_string(),
                name: "Ben".to_string(),
                points: 10,
                percentage: 33,
                breakdown: Breakdown::default(),
            },
            ContributionScore {
                user_id: "u3".to_string(),
                name: "Cleo".to_string(),
                points: 10,
                percentage: 33,
                breakdown: Breakdown::default(),
            },
        ];

        let mut review_summary = ReviewSummary::new();
        review_summary.insert(
            "u2".to_string(),
            ReviewAverages {
                name: "Ben".to_string(),
                avg_quality: 4.5,
                avg_communication: 4.0,
                avg_timeliness: 3.5,
                avg_initiative: 4.0,
                review_count: 2,
            },
        );

        Report {
            metadata,
            payload: ReportPayload {
                project: ProjectInfo {
                    id: "p1".to_string(),
                    name: "Orbit Planner".to_string(),
                    course_code: Some("CS 3100".to_string()),
                },
                team_size: 3,
                task_stats: TaskStats {
                    total: 5,
                    todo: 1,
                    in_progress: 1,
                    done: 3,
                    overdue: 1,
                },
                members: vec![MemberSummary {
                    user_id: "u1".to_string(),
                    name: "Ana".to_string(),
                    contribution_percent: 33,
                    points: 10,
                    tasks_completed: 1,
                    tasks_created: 1,
                    tasks_in_progress: 1,
                    peer_rating: None,
                }],
                contributions,
                review_summary,
                flags: vec![Flag {
                    user_id: "u3".to_string(),
                    subject_name: "Cleo".to_string(),
                    reason: FlagReason::HighRatingLowActivity,
                }],
            },
            narrative: None,
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("# Contribution Report: Orbit Planner"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Tasks"));
        assert!(markdown.contains("## Contributions"));
        assert!(markdown.contains("## Peer Reviews"));
        assert!(markdown.contains("**Cleo**: High peer rating but low activity"));
        assert!(!markdown.contains("## Evaluator Narrative"));
    }

    #[test]
    fn test_rounding_note_when_shares_drift() {
        let report = create_test_report();
        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("add up to 99%"));
    }

    #[test]
    fn test_breakdown_columns_toggle() {
        let report = create_test_report();

        let full = generate_markdown_report(&report, &ReportConfig::default());
        assert!(full.contains("| 1 | Ana | 10 | 33% | 1 | 1 | 1 | 0 |"));

        let options = ReportConfig {
            include_breakdown: false,
            include_reviews: false,
            ..ReportConfig::default()
        };
        let compact = generate_markdown_report(&report, &options);
        assert!(compact.contains("| 1 | Ana | 10 | 33% |\n"));
        assert!(!compact.contains("## Peer Reviews"));
    }

    #[test]
    fn test_reviews_section() {
        let report = create_test_report();
        let section = generate_reviews_section(&report.payload.review_summary);

        assert!(section.contains("| Ben | 4.5 | 4.0 | 3.5 | 4.0 | 4.00 | 2 |"));
        assert!(generate_reviews_section(&ReviewSummary::new()).contains("No peer reviews"));
    }

    #[test]
    fn test_pipe_in_member_name_is_escaped() {
        let mut report = create_test_report();
        report.payload.contributions[0].name = "Ana | Lead".to_string();
        if let Some(ben) = report.payload.review_summary.get_mut("u2") {
            ben.name = "Ben|B".to_string();
        }

        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("| 1 | Ana \\| Lead | 10 | 33% |"));
        assert!(markdown.contains("| Ben\\|B | 4.5 |"));
    }

    #[test]
    fn test_flags_section_empty() {
        assert!(generate_flags_section(&[]).contains("No fairness flags raised."));
    }

    #[test]
    fn test_narrative_section_included() {
        let mut report = create_test_report();
        report.narrative = Some("  The team delivered on time.\n".to_string());
        report.metadata.model_used = Some("llama3.2:latest".to_string());

        let markdown = generate_markdown_report(&report, &ReportConfig::default());

        assert!(markdown.contains("## Evaluator Narrative\n\nThe team delivered on time.\n\n"));
        assert!(markdown.contains("- [Evaluator Narrative](#evaluator-narrative)"));
        assert!(markdown.contains("**Narrative Model:** `llama3.2:latest`"));
    }

    #[test]
    fn test_generate_json_report() {
        let report = create_test_report();
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"projectName\""));
        assert!(json.contains("\"contributions\""));
        assert!(json.contains("\"reasonCode\": \"High peer rating but low activity\""));
        assert!(!json.contains("\"narrative\""));
    }
}
