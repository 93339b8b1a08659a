//! Report Builder — serializes Content Store data into a paginated PDF via
//! genpdf. The whole document is built in memory; an error at any point
//! discards the partial buffer and surfaces `AppError::Report`.

pub mod charts;
pub mod handlers;

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use genpdf::elements::{Break, FrameCellDecorator, PageBreak, Paragraph, TableLayout};
use genpdf::style::Style;
use genpdf::{Alignment, Document, Element as _, SimplePageDecorator};

use crate::errors::AppError;
use crate::models::activity::{ActivityKind, ActivityRecord};
use crate::models::flashcard::Flashcard;
use crate::progress::{
    self, score_series, strengths_and_weaknesses, subject_stats, SubjectStats, Trend,
};
use crate::store::SessionData;

fn report_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Report(format!("document rendering failed: {e}"))
}

fn load_document(font_dir: &str, font_family: &str, title: &str) -> Result<Document, AppError> {
    let family = genpdf::fonts::from_files(font_dir, font_family, None)
        .map_err(|e| AppError::Report(format!("could not load report fonts: {e}")))?;
    let mut doc = Document::new(family);
    doc.set_title(title);
    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(15);
    doc.set_page_decorator(decorator);
    Ok(doc)
}

fn title(text: &str) -> impl genpdf::Element {
    Paragraph::new(text)
        .aligned(Alignment::Center)
        .styled(Style::new().bold().with_font_size(20))
}

fn heading(text: &str) -> impl genpdf::Element {
    Paragraph::new(text).styled(Style::new().bold().with_font_size(14))
}

fn subheading(text: &str) -> impl genpdf::Element {
    Paragraph::new(text).styled(Style::new().bold().with_font_size(12))
}

fn body(text: impl Into<String>) -> Paragraph {
    Paragraph::new(text.into())
}

fn push_table(
    doc: &mut Document,
    weights: Vec<usize>,
    header: &[&str],
    rows: &[Vec<String>],
) -> Result<(), AppError> {
    let mut table = TableLayout::new(weights);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let mut header_row = table.row();
    for cell in header {
        header_row = header_row.element(Paragraph::new(*cell).styled(Style::new().bold()));
    }
    header_row.push().map_err(report_err)?;

    for row in rows {
        let mut table_row = table.row();
        for cell in row {
            table_row = table_row.element(Paragraph::new(cell.clone()));
        }
        table_row.push().map_err(report_err)?;
    }

    doc.push(table);
    Ok(())
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Improving => "Improving",
        Trend::Declining => "Declining",
        Trend::Stable => "Stable",
        Trend::InsufficientData => "No data",
    }
}

fn percent_or_no_data(value: Option<f64>) -> String {
    value.map_or_else(|| "No data".to_string(), |v| format!("{v:.1}%"))
}

// ────────────────────────────────────────────────────────────────────────────
// Progress report
// ────────────────────────────────────────────────────────────────────────────

/// Builds the full study-progress PDF.
pub fn build_progress_report(
    data: &SessionData,
    now: DateTime<Utc>,
    font_dir: &str,
    font_family: &str,
) -> Result<Bytes, AppError> {
    let records = &data.activity;
    let overall = subject_stats(records, None);

    let mut doc = load_document(font_dir, font_family, "Study Progress Report")?;

    doc.push(title("Study Progress Report"));
    doc.push(Break::new(1.0));
    doc.push(body(format!("Generated on: {}", now.format("%B %d, %Y"))));
    doc.push(body(format!("Study period: {}", study_period(records))));
    doc.push(Break::new(1.5));

    // Executive summary
    doc.push(heading("Executive Summary"));
    push_table(
        &mut doc,
        vec![2, 1],
        &["Metric", "Value"],
        &[
            vec!["Total study sessions".into(), overall.total_sessions.to_string()],
            vec![
                "Total study time".into(),
                format!("{} minutes", overall.total_study_minutes),
            ],
            vec![
                "Average quiz score".into(),
                percent_or_no_data(overall.average_score),
            ],
            vec![
                "Questions answered".into(),
                overall.total_questions.to_string(),
            ],
            vec!["Overall accuracy".into(), percent_or_no_data(overall.accuracy)],
            vec![
                "Performance trend".into(),
                trend_label(overall.trend).to_string(),
            ],
        ],
    )?;
    doc.push(Break::new(1.0));

    // Per-subject performance
    doc.push(heading("Subject Performance"));
    let per_subject: BTreeMap<String, SubjectStats> = data
        .subjects()
        .into_iter()
        .chain(records.iter().map(|r| r.subject.clone()))
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .map(|s| {
            let stats = subject_stats(records, Some(&s));
            (s, stats)
        })
        .collect();
    if per_subject.is_empty() {
        doc.push(body("No subjects recorded yet."));
    } else {
        let rows: Vec<Vec<String>> = per_subject
            .iter()
            .map(|(subject, stats)| {
                vec![
                    subject.clone(),
                    stats.total_sessions.to_string(),
                    percent_or_no_data(stats.average_score),
                    percent_or_no_data(stats.accuracy),
                    trend_label(stats.trend).to_string(),
                ]
            })
            .collect();
        push_table(
            &mut doc,
            vec![2, 1, 1, 1, 1],
            &["Subject", "Sessions", "Avg Score", "Accuracy", "Trend"],
            &rows,
        )?;
    }
    doc.push(Break::new(1.0));

    // Strengths and weaknesses
    doc.push(heading("Strengths & Areas for Improvement"));
    let analysis = strengths_and_weaknesses(records);
    if !analysis.strengths.is_empty() {
        doc.push(subheading("Strengths:"));
        for strength in &analysis.strengths {
            doc.push(body(format!("- {strength}")));
        }
        doc.push(Break::new(0.5));
    }
    if !analysis.needs_improvement.is_empty() {
        doc.push(subheading("Areas for improvement:"));
        for weakness in &analysis.needs_improvement {
            doc.push(body(format!("- {weakness}")));
        }
        doc.push(Break::new(0.5));
    }
    if analysis.strengths.is_empty() && analysis.needs_improvement.is_empty() {
        doc.push(body(
            "Not enough scored quizzes yet to analyze strengths and weaknesses.",
        ));
    }
    doc.push(Break::new(1.0));

    // Recommendations
    doc.push(heading("Personalized Recommendations"));
    for (index, tip) in progress::recommendations(records, now).iter().enumerate() {
        doc.push(body(format!("{}. {tip}", index + 1)));
    }
    doc.push(Break::new(1.0));

    // Study habits
    doc.push(heading("Study Habits Analysis"));
    for (habit, description) in study_habits(records) {
        doc.push(body(format!("{habit}: {description}")));
    }
    doc.push(Break::new(1.0));

    // Recent activity
    doc.push(heading("Recent Activity (Last 7 Days)"));
    let recent = recent_activity_rows(records, now);
    if recent.is_empty() {
        doc.push(body("No recent activity in the last 7 days."));
    } else {
        push_table(
            &mut doc,
            vec![1, 2, 2, 1],
            &["Date", "Activity", "Subject", "Score/Duration"],
            &recent,
        )?;
    }
    doc.push(Break::new(1.0));

    // Score chart
    let series = score_series(records);
    if let Some(chart) = charts::score_chart(&series)? {
        doc.push(heading("Quiz Scores Over Time"));
        let image = genpdf::elements::Image::from_dynamic_image(chart)
            .map_err(report_err)?
            .with_alignment(Alignment::Center);
        doc.push(image);
    }

    // Goals page
    doc.push(PageBreak::new());
    doc.push(heading("Suggested Goals & Next Steps"));
    for (index, goal) in suggested_goals(&overall, records).iter().enumerate() {
        doc.push(body(format!("{}. {goal}", index + 1)));
    }

    let mut out = Vec::new();
    doc.render(&mut out).map_err(report_err)?;
    Ok(Bytes::from(out))
}

fn study_period(records: &[ActivityRecord]) -> String {
    let mut timestamps: Vec<DateTime<Utc>> = records.iter().map(|r| r.timestamp).collect();
    timestamps.sort();
    match (timestamps.first(), timestamps.last()) {
        (Some(first), Some(last)) => {
            let earliest = first.format("%B %d, %Y").to_string();
            let latest = last.format("%B %d, %Y").to_string();
            if earliest == latest {
                earliest
            } else {
                format!("{earliest} to {latest}")
            }
        }
        _ => "No sessions recorded".to_string(),
    }
}

fn study_habits(records: &[ActivityRecord]) -> Vec<(String, String)> {
    if records.is_empty() {
        return vec![("Study habits".to_string(), "No data available".to_string())];
    }

    let mut habits = Vec::new();

    let unique_days: std::collections::BTreeSet<_> =
        records.iter().map(|r| r.timestamp.date_naive()).collect();
    let span_days = match (unique_days.first(), unique_days.last()) {
        (Some(first), Some(last)) => (*last - *first).num_days().max(0) + 1,
        _ => 1,
    };
    let frequency = unique_days.len() as f64 / span_days as f64 * 100.0;
    habits.push((
        "Study frequency".to_string(),
        format!(
            "{frequency:.1}% of days ({} days out of {span_days})",
            unique_days.len()
        ),
    ));

    let average_minutes =
        records.iter().map(|r| f64::from(r.duration_minutes)).sum::<f64>() / records.len() as f64;
    habits.push((
        "Average session length".to_string(),
        format!("{average_minutes:.1} minutes"),
    ));

    if let Some(most_studied) = mode_by(records, |r| r.subject.clone()) {
        habits.push(("Most studied subject".to_string(), most_studied));
    }
    if let Some(preferred) = mode_by(records, |r| activity_label(r.kind).to_string()) {
        habits.push(("Preferred activity".to_string(), preferred));
    }

    habits
}

fn mode_by(records: &[ActivityRecord], key: impl Fn(&ActivityRecord) -> String) -> Option<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(key(record)).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| value)
}

fn activity_label(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::NoteCreated => "Notes",
        ActivityKind::FlashcardsGenerated => "Flashcard creation",
        ActivityKind::FlashcardReviewed => "Flashcard review",
        ActivityKind::QuizGenerated => "Quiz creation",
        ActivityKind::QuizAttempted => "Quiz",
        ActivityKind::TextGraded => "Writing",
    }
}

fn recent_activity_rows(records: &[ActivityRecord], now: DateTime<Utc>) -> Vec<Vec<String>> {
    let week_ago = now - chrono::Duration::days(7);
    let mut recent: Vec<&ActivityRecord> =
        records.iter().filter(|r| r.timestamp > week_ago).collect();
    recent.sort_by_key(|r| std::cmp::Reverse(r.timestamp));

    recent
        .iter()
        .take(10)
        .map(|record| {
            let score_or_duration = match record.score {
                Some(score) => format!("{score:.0}%"),
                None => format!("{} min", record.duration_minutes),
            };
            vec![
                record.timestamp.format("%m/%d").to_string(),
                activity_label(record.kind).to_string(),
                record.subject.clone(),
                score_or_duration,
            ]
        })
        .collect()
}

fn suggested_goals(overall: &SubjectStats, records: &[ActivityRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec!["Complete your first study session to get personalized goals!".to_string()];
    }

    let mut goals = Vec::new();

    match overall.average_score {
        Some(score) if score < 80.0 => {
            goals.push("Aim to achieve an average quiz score of 80% or higher".to_string());
        }
        Some(score) if score < 90.0 => {
            goals.push("Challenge yourself to reach a 90% average quiz score".to_string());
        }
        _ => {}
    }
    if overall.total_sessions < 10 {
        goals.push("Build a study habit by completing 10 total study sessions".to_string());
    }
    if overall.total_study_minutes < 120 {
        goals.push("Dedicate at least 30 minutes per week to studying".to_string());
    }
    let subjects: std::collections::BTreeSet<_> =
        records.iter().map(|r| r.subject.as_str()).collect();
    if subjects.len() == 1 {
        goals.push("Explore studying multiple subjects to broaden your knowledge".to_string());
    }
    if overall.quiz_sessions < 3 {
        goals.push("Take more quizzes to test your knowledge and track progress".to_string());
    }
    if goals.is_empty() {
        goals.push("Maintain your excellent study habits and continue learning!".to_string());
    }
    goals
}

// ────────────────────────────────────────────────────────────────────────────
// Flashcard report
// ────────────────────────────────────────────────────────────────────────────

/// Builds the flashcard study report: summary statistics, then every card
/// grouped by category.
pub fn build_flashcard_report(
    data: &SessionData,
    now: DateTime<Utc>,
    font_dir: &str,
    font_family: &str,
) -> Result<Bytes, AppError> {
    let cards = &data.flashcards;
    let mut doc = load_document(font_dir, font_family, "Flashcard Study Report")?;

    doc.push(title("Flashcard Study Report"));
    doc.push(Break::new(1.0));
    doc.push(body(format!("Generated on: {}", now.format("%B %d, %Y"))));
    doc.push(Break::new(1.0));

    doc.push(heading("Summary Statistics"));
    let reviewed = cards.iter().filter(|c| c.last_reviewed.is_some()).count();
    let mastered = cards
        .iter()
        .filter(|c| c.accuracy().is_some_and(|a| a >= 0.8))
        .count();
    doc.push(body(format!("Total flashcards: {}", cards.len())));
    doc.push(body(format!("Cards reviewed: {reviewed}")));
    doc.push(body(format!("Cards mastered (≥80% pass rate): {mastered}")));
    doc.push(Break::new(1.0));

    doc.push(heading("Your Flashcards"));
    if cards.is_empty() {
        doc.push(body("No flashcards yet."));
    } else {
        for (category, group) in cards_by_category(cards) {
            doc.push(subheading(&category));
            for (index, card) in group.iter().enumerate() {
                doc.push(body(format!("Card {}:", index + 1)).styled(Style::new().bold()));
                doc.push(body(format!("Front: {}", card.front)));
                doc.push(body(format!("Back: {}", card.back)));
                doc.push(body(format!("Difficulty: {}", card.difficulty)));
                doc.push(Break::new(0.5));
            }
        }
    }

    let mut out = Vec::new();
    doc.render(&mut out).map_err(report_err)?;
    Ok(Bytes::from(out))
}

fn cards_by_category(cards: &[Flashcard]) -> BTreeMap<String, Vec<&Flashcard>> {
    let mut groups: BTreeMap<String, Vec<&Flashcard>> = BTreeMap::new();
    for card in cards {
        groups.entry(card.category.clone()).or_default().push(card);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    use crate::models::Difficulty;

    fn record(subject: &str, minutes_ago: i64, score: Option<f64>) -> ActivityRecord {
        ActivityRecord {
            id: Uuid::new_v4(),
            kind: if score.is_some() {
                ActivityKind::QuizAttempted
            } else {
                ActivityKind::NoteCreated
            },
            subject: subject.to_string(),
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            score,
            duration_minutes: 15,
            questions_answered: 0,
            correct_answers: 0,
            notes_created: 0,
            flashcards_studied: 0,
        }
    }

    #[test]
    fn test_study_period_empty() {
        assert_eq!(study_period(&[]), "No sessions recorded");
    }

    #[test]
    fn test_study_period_single_day_collapses() {
        let records = vec![record("Biology", 5, None), record("Biology", 10, None)];
        let period = study_period(&records);
        assert!(!period.contains(" to "));
    }

    #[test]
    fn test_recent_activity_rows_capped_at_ten_newest_first() {
        let records: Vec<ActivityRecord> =
            (0..15).map(|i| record("Biology", i * 10, Some(50.0))).collect();
        let rows = recent_activity_rows(&records, Utc::now());
        assert_eq!(rows.len(), 10);
    }

    #[test]
    fn test_goals_for_weak_scores() {
        let records = vec![
            record("Biology", 10, Some(60.0)),
            record("Biology", 20, Some(70.0)),
        ];
        let overall = subject_stats(&records, None);
        let goals = suggested_goals(&overall, &records);
        assert!(goals.iter().any(|g| g.contains("80% or higher")));
        assert!(goals.iter().any(|g| g.contains("multiple subjects")));
    }

    #[test]
    fn test_goals_for_empty_history() {
        let overall = subject_stats(&[], None);
        let goals = suggested_goals(&overall, &[]);
        assert_eq!(goals.len(), 1);
        assert!(goals[0].contains("first study session"));
    }

    #[test]
    fn test_study_habits_reports_frequency_and_mode() {
        let records = vec![
            record("Biology", 10, Some(80.0)),
            record("Biology", 20, None),
            record("History", 30, None),
        ];
        let habits = study_habits(&records);
        let keys: Vec<&str> = habits.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"Study frequency"));
        assert!(keys.contains(&"Most studied subject"));
        let most = habits
            .iter()
            .find(|(k, _)| k == "Most studied subject")
            .unwrap();
        assert_eq!(most.1, "Biology");
    }

    /// Full render needs TTF fonts on disk; run with `--ignored` where the
    /// Liberation fonts are installed.
    #[test]
    #[ignore]
    fn test_progress_report_renders_pdf() {
        let mut data = SessionData::default();
        data.activity = vec![
            record("Biology", 30, Some(70.0)),
            record("Biology", 20, Some(80.0)),
            record("History", 10, Some(90.0)),
        ];
        let pdf = build_progress_report(
            &data,
            Utc::now(),
            "/usr/share/fonts/truetype/liberation",
            "LiberationSans",
        )
        .unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    /// Same font requirement as above.
    #[test]
    #[ignore]
    fn test_flashcard_report_renders_pdf() {
        let mut data = SessionData::default();
        data.flashcards.push(Flashcard {
            id: Uuid::new_v4(),
            front: "Define osmosis".to_string(),
            back: "Diffusion of water".to_string(),
            category: "Biology".to_string(),
            difficulty: Difficulty::Easy,
            created_at: Utc::now(),
            last_reviewed: None,
            review_history: vec![],
        });
        let pdf = build_flashcard_report(
            &data,
            Utc::now(),
            "/usr/share/fonts/truetype/liberation",
            "LiberationSans",
        )
        .unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
