use std::fmt::Write;

use chrono::NaiveDate;

use crate::error::{Result, TrackerError};
use crate::models::{Dataset, RankedStudent};
use crate::ranking;
use crate::rating;

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub group_name: String,
    pub student_count: usize,
    pub avg_percentage: f64,
    pub top_student: Option<String>,
    pub representative: Option<String>,
}

pub fn summarize_by_group(dataset: &Dataset, ranked: &[RankedStudent]) -> Vec<GroupSummary> {
    dataset
        .groups
        .iter()
        .map(|group| {
            let members: Vec<&RankedStudent> =
                ranked.iter().filter(|s| s.group_id == group.id).collect();
            let total: i64 = members.iter().map(|s| i64::from(s.percentage)).sum();
            GroupSummary {
                group_name: group.name.clone(),
                student_count: members.len(),
                avg_percentage: if members.is_empty() {
                    0.0
                } else {
                    total as f64 / members.len() as f64
                },
                top_student: members.first().map(|s| s.name.clone()),
                representative: members
                    .iter()
                    .find(|s| s.is_representative)
                    .map(|s| s.name.clone()),
            }
        })
        .collect()
}

/// Number of students per star tier, index 0 being one star.
pub fn star_distribution(ranked: &[RankedStudent], thresholds: &[i32]) -> Vec<usize> {
    let mut counts = vec![0; thresholds.len()];
    for student in ranked {
        if let Some(stars) = rating::star_rating(student.percentage, thresholds) {
            counts[stars - 1] += 1;
        }
    }
    counts
}

pub fn build_report(
    dataset: &Dataset,
    group_id: Option<&str>,
    generated_on: NaiveDate,
) -> Result<String> {
    let scope = match group_id {
        Some(id) => dataset
            .group(id)
            .map(|group| group.name.as_str())
            .ok_or_else(|| TrackerError::group_not_found(id))?,
        None => "all fields",
    };
    let ranked: Vec<RankedStudent> = ranking::compute_ranks(dataset)
        .into_iter()
        .filter(|s| group_id.map_or(true, |id| s.group_id == id))
        .collect();
    let thresholds = &dataset.settings.star_thresholds;
    let max_stars = thresholds.len();

    let mut output = String::new();

    let _ = writeln!(output, "# Student Progress Report");
    let _ = writeln!(output, "Generated for {} on {}", scope, generated_on);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Leaderboard");

    if ranked.is_empty() {
        let _ = writeln!(output, "No students recorded.");
    } else {
        let _ = writeln!(output, "| Rank | Student | Field | Score | Stars |");
        let _ = writeln!(output, "|---:|---|---|---:|---|");
        for student in &ranked {
            let stars = rating::star_rating(student.percentage, thresholds).unwrap_or(0);
            let marker = if student.is_representative { " (CR)" } else { "" };
            let _ = writeln!(
                output,
                "| #{} | {}{} | {} | {}% | {} |",
                student.rank,
                student.name,
                marker,
                student.group_name,
                student.percentage,
                rating::stars_label(stars, max_stars)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Fields");
    let summaries: Vec<GroupSummary> = summarize_by_group(dataset, &ranked)
        .into_iter()
        .filter(|summary| summary.student_count > 0)
        .collect();

    if summaries.is_empty() {
        let _ = writeln!(output, "No fields with students.");
    } else {
        for summary in &summaries {
            let _ = writeln!(
                output,
                "- {}: {} students, avg {:.1}%, top {}, CR {}",
                summary.group_name,
                summary.student_count,
                summary.avg_percentage,
                summary.top_student.as_deref().unwrap_or("-"),
                summary.representative.as_deref().unwrap_or("none")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Star Distribution");
    for (index, count) in star_distribution(&ranked, thresholds).iter().enumerate().rev() {
        let _ = writeln!(
            output,
            "- {} (up to {}%): {}",
            rating::stars_label(index + 1, max_stars),
            thresholds[index],
            count
        );
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 2).unwrap()
    }

    #[test]
    fn summaries_cover_every_group() {
        let dataset = seed::sample_dataset();
        let ranked = ranking::compute_ranks(&dataset);
        let summaries = summarize_by_group(&dataset, &ranked);

        assert_eq!(summaries.len(), 3);
        let cs = &summaries[0];
        assert_eq!(cs.student_count, 3);
        assert!((cs.avg_percentage - (92.0 + 92.0 + 78.0) / 3.0).abs() < 0.001);
        assert_eq!(cs.top_student.as_deref(), Some("Avery Lee"));
        assert_eq!(cs.representative.as_deref(), Some("Avery Lee"));
        assert_eq!(summaries[2].representative, None);
    }

    #[test]
    fn distribution_counts_each_tier() {
        let dataset = seed::sample_dataset();
        let ranked = ranking::compute_ranks(&dataset);
        // 33 -> 2, 47 -> 3, 61 and 78 -> 4, the rest -> 5
        assert_eq!(
            star_distribution(&ranked, &dataset.settings.star_thresholds),
            vec![0, 1, 1, 2, 3]
        );
    }

    #[test]
    fn report_lists_leaderboard_and_fields() {
        let report = build_report(&seed::sample_dataset(), None, date()).unwrap();
        assert!(report.starts_with("# Student Progress Report\nGenerated for all fields on 2026-02-02"));
        assert!(report.contains("| #1 | Avery Lee (CR) | Computer Science | 92% | ★★★★★ |"));
        assert!(report.contains("| #1 | Noor Haddad | Computer Science | 92% | ★★★★★ |"));
        assert!(report.contains("| #3 | Kiara Patel (CR) |"));
        assert!(report.contains("- Biotechnology: 2 students, avg 40.0%, top Mei Tanaka, CR none"));
        assert!(report.contains("- ★★☆☆☆ (up to 40%): 1"));
    }

    #[test]
    fn report_can_focus_on_one_group() {
        let report = build_report(&seed::sample_dataset(), Some("f-me"), date()).unwrap();
        assert!(report.contains("Generated for Mechanical Engineering"));
        assert!(report.contains("Kiara Patel"));
        assert!(!report.contains("Avery Lee"));
        assert!(!report.contains("- Computer Science:"));
    }

    #[test]
    fn unknown_group_is_rejected() {
        let err = build_report(&seed::sample_dataset(), Some("f-gone"), date()).unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { .. }));
    }
}
