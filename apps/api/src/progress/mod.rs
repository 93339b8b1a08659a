//! Progress Tracker — pure functions over one session's activity log.
//! No side effects; everything is recomputed on demand from the records.
//!
//! A subject with zero scored attempts reports `None` for its averages —
//! rendered as "no data" — never a fabricated zero.

pub mod handlers;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use crate::models::activity::{ActivityKind, ActivityRecord};

/// How many recent scored attempts feed trend and weak-subject analysis.
const RECENT_WINDOW: usize = 5;
/// Score-delta threshold between window halves before a trend is called.
const TREND_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

/// Aggregate statistics for one subject (or the whole session).
#[derive(Debug, Clone, Serialize)]
pub struct SubjectStats {
    pub total_sessions: usize,
    pub total_study_minutes: u32,
    pub quiz_sessions: usize,
    /// Mean percent score over scored quiz attempts; `None` with no data.
    pub average_score: Option<f64>,
    pub total_questions: u32,
    pub total_correct: u32,
    /// Correct/answered over all records; `None` when nothing was answered.
    pub accuracy: Option<f64>,
    pub trend: Trend,
    pub notes_created: u32,
    pub flashcards_studied: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressOverview {
    pub overall: SubjectStats,
    pub subjects: BTreeMap<String, SubjectStats>,
    pub weak_subjects: Vec<WeakSubject>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklySummary {
    pub period_days: u32,
    pub total_sessions: usize,
    pub total_study_minutes: u32,
    pub subjects: BTreeMap<String, SubjectStats>,
}

/// A subject ranked by weak recent performance.
#[derive(Debug, Clone, Serialize)]
pub struct WeakSubject {
    pub subject: String,
    /// Mean percent score over the subject's recent scored attempts.
    pub recent_average: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrengthsAnalysis {
    pub strengths: Vec<String>,
    pub needs_improvement: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScorePoint {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub subject: String,
}

/// View-model data for the charts endpoint and the PDF report.
#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub score_series: Vec<ScorePoint>,
    pub subject_minutes: BTreeMap<String, u32>,
    /// Sessions per weekday, Monday first.
    pub weekday_counts: [u32; 7],
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregation
// ────────────────────────────────────────────────────────────────────────────

/// Scored quiz attempts, oldest first.
fn scored_quiz_records<'a>(records: &'a [ActivityRecord]) -> Vec<&'a ActivityRecord> {
    let mut scored: Vec<&ActivityRecord> = records
        .iter()
        .filter(|r| r.kind == ActivityKind::QuizAttempted && r.score.is_some())
        .collect();
    scored.sort_by_key(|r| r.timestamp);
    scored
}

pub fn subject_stats(records: &[ActivityRecord], subject: Option<&str>) -> SubjectStats {
    let filtered: Vec<&ActivityRecord> = records
        .iter()
        .filter(|r| subject.map_or(true, |s| r.subject == s))
        .collect();

    let mut scored: Vec<&ActivityRecord> = filtered
        .iter()
        .copied()
        .filter(|r| r.kind == ActivityKind::QuizAttempted && r.score.is_some())
        .collect();
    scored.sort_by_key(|r| r.timestamp);

    let total_questions: u32 = filtered.iter().map(|r| r.questions_answered).sum();
    let total_correct: u32 = filtered.iter().map(|r| r.correct_answers).sum();

    let average_score = if scored.is_empty() {
        None
    } else {
        let sum: f64 = scored.iter().filter_map(|r| r.score).sum();
        Some(sum / scored.len() as f64)
    };

    let accuracy = if total_questions > 0 {
        Some(f64::from(total_correct) / f64::from(total_questions) * 100.0)
    } else {
        None
    };

    let scores: Vec<f64> = scored.iter().filter_map(|r| r.score).collect();

    SubjectStats {
        total_sessions: filtered.len(),
        total_study_minutes: filtered.iter().map(|r| r.duration_minutes).sum(),
        quiz_sessions: scored.len(),
        average_score,
        total_questions,
        total_correct,
        accuracy,
        trend: trend_of(&scores),
        notes_created: filtered.iter().map(|r| r.notes_created).sum(),
        flashcards_studied: filtered.iter().map(|r| r.flashcards_studied).sum(),
    }
}

/// Improving / declining / stable over the last few scored attempts:
/// compares the mean of the window's first half against its second half.
fn trend_of(scores: &[f64]) -> Trend {
    if scores.len() < 2 {
        return Trend::InsufficientData;
    }
    let recent: &[f64] = if scores.len() > RECENT_WINDOW {
        &scores[scores.len() - RECENT_WINDOW..]
    } else {
        scores
    };

    let half = recent.len() / 2;
    let first: f64 = recent[..half].iter().sum::<f64>() / half as f64;
    let second: f64 = recent[half..].iter().sum::<f64>() / (recent.len() - half) as f64;
    let difference = second - first;

    if difference > TREND_THRESHOLD {
        Trend::Improving
    } else if difference < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

fn subjects_of(records: &[ActivityRecord]) -> BTreeSet<String> {
    records.iter().map(|r| r.subject.clone()).collect()
}

pub fn overview(records: &[ActivityRecord]) -> ProgressOverview {
    let subjects = subjects_of(records)
        .into_iter()
        .map(|subject| {
            let stats = subject_stats(records, Some(&subject));
            (subject, stats)
        })
        .collect();

    ProgressOverview {
        overall: subject_stats(records, None),
        subjects,
        weak_subjects: weak_subjects(records),
    }
}

pub fn weekly_summary(records: &[ActivityRecord], now: DateTime<Utc>) -> WeeklySummary {
    let week_ago = now - Duration::days(7);
    let week_records: Vec<ActivityRecord> = records
        .iter()
        .filter(|r| r.timestamp > week_ago)
        .cloned()
        .collect();

    let subjects = subjects_of(&week_records)
        .into_iter()
        .map(|subject| {
            let stats = subject_stats(&week_records, Some(&subject));
            (subject, stats)
        })
        .collect();

    WeeklySummary {
        period_days: 7,
        total_sessions: week_records.len(),
        total_study_minutes: week_records.iter().map(|r| r.duration_minutes).sum(),
        subjects,
    }
}

/// Subjects ranked by lowest recent average score. Subjects with no scored
/// attempts are excluded entirely rather than ranked as zero.
pub fn weak_subjects(records: &[ActivityRecord]) -> Vec<WeakSubject> {
    let mut ranked: Vec<WeakSubject> = subjects_of(records)
        .into_iter()
        .filter_map(|subject| {
            let scores: Vec<f64> = scored_quiz_records(records)
                .into_iter()
                .filter(|r| r.subject == subject)
                .filter_map(|r| r.score)
                .collect();
            if scores.is_empty() {
                return None;
            }
            let recent: &[f64] = if scores.len() > RECENT_WINDOW {
                &scores[scores.len() - RECENT_WINDOW..]
            } else {
                &scores
            };
            Some(WeakSubject {
                subject,
                recent_average: recent.iter().sum::<f64>() / recent.len() as f64,
                samples: recent.len(),
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.recent_average
            .partial_cmp(&b.recent_average)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

/// Strengths (average ≥ 85%) and needs-improvement (< 70%) subjects, with
/// recommendation strings. Subjects need at least two scores to qualify.
pub fn strengths_and_weaknesses(records: &[ActivityRecord]) -> StrengthsAnalysis {
    let mut strengths = Vec::new();
    let mut needs_improvement = Vec::new();

    for subject in subjects_of(records) {
        let scores: Vec<f64> = scored_quiz_records(records)
            .into_iter()
            .filter(|r| r.subject == subject)
            .filter_map(|r| r.score)
            .collect();
        if scores.len() < 2 {
            continue;
        }
        let average = scores.iter().sum::<f64>() / scores.len() as f64;
        if average >= 85.0 {
            strengths.push(format!("{subject} (avg: {average:.1}%)"));
        } else if average < 70.0 {
            needs_improvement.push(format!("{subject} (avg: {average:.1}%)"));
        }
    }

    let mut recommendations = Vec::new();
    if !needs_improvement.is_empty() {
        recommendations.extend([
            "Create more flashcards for subjects needing improvement".to_string(),
            "Schedule regular review sessions for weak subjects".to_string(),
            "Try different question types to reinforce learning".to_string(),
        ]);
    }
    if !strengths.is_empty() {
        recommendations.push("Continue regular practice in your strong subjects".to_string());
    }

    StrengthsAnalysis {
        strengths,
        needs_improvement,
        recommendations,
    }
}

/// Personalized study recommendations from the last week of activity.
pub fn recommendations(records: &[ActivityRecord], now: DateTime<Utc>) -> Vec<String> {
    if records.is_empty() {
        return vec![
            "Start by creating some notes and taking quizzes to get personalized recommendations!"
                .to_string(),
        ];
    }

    let week_ago = now - Duration::days(7);
    let recent: Vec<&ActivityRecord> = records
        .iter()
        .filter(|r| r.timestamp > week_ago)
        .collect();

    let mut recommendations = Vec::new();

    if recent.len() < 3 {
        recommendations.push(
            "Try to study more consistently - aim for at least 3 sessions per week".to_string(),
        );
    }

    let quiz_scores: Vec<f64> = recent
        .iter()
        .filter(|r| r.kind == ActivityKind::QuizAttempted)
        .filter_map(|r| r.score)
        .collect();
    if !quiz_scores.is_empty() {
        let average = quiz_scores.iter().sum::<f64>() / quiz_scores.len() as f64;
        if average < 75.0 {
            recommendations
                .push("Consider reviewing your notes before taking quizzes".to_string());
            recommendations
                .push("Try creating flashcards to reinforce key concepts".to_string());
        }
    }

    let total_minutes: u32 = recent.iter().map(|r| r.duration_minutes).sum();
    if total_minutes < 60 {
        recommendations.push(
            "Consider increasing your study time - even 15 minutes daily helps!".to_string(),
        );
    }

    let subjects: BTreeSet<&str> = recent.iter().map(|r| r.subject.as_str()).collect();
    if subjects.len() == 1 {
        recommendations.push(
            "Try studying multiple subjects to keep learning diverse and engaging".to_string(),
        );
    }

    if recommendations.is_empty() {
        recommendations
            .push("Great job! You're maintaining good study habits. Keep it up!".to_string());
    }
    recommendations
}

// ────────────────────────────────────────────────────────────────────────────
// Chart view-models
// ────────────────────────────────────────────────────────────────────────────

/// Last 10 scored quiz attempts, oldest first.
pub fn score_series(records: &[ActivityRecord]) -> Vec<ScorePoint> {
    let scored = scored_quiz_records(records);
    scored
        .iter()
        .rev()
        .take(10)
        .rev()
        .map(|r| ScorePoint {
            timestamp: r.timestamp,
            score: r.score.unwrap_or_default(),
            subject: r.subject.clone(),
        })
        .collect()
}

pub fn subject_minutes(records: &[ActivityRecord]) -> BTreeMap<String, u32> {
    let mut minutes: BTreeMap<String, u32> = BTreeMap::new();
    for record in records {
        *minutes.entry(record.subject.clone()).or_default() += record.duration_minutes;
    }
    minutes
}

/// Sessions per weekday, Monday first.
pub fn weekday_counts(records: &[ActivityRecord]) -> [u32; 7] {
    let mut counts = [0u32; 7];
    for record in records {
        counts[record.timestamp.weekday().num_days_from_monday() as usize] += 1;
    }
    counts
}

pub fn chart_data(records: &[ActivityRecord]) -> ChartData {
    ChartData {
        score_series: score_series(records),
        subject_minutes: subject_minutes(records),
        weekday_counts: weekday_counts(records),
    }
}
