//! Content Store — per-session, in-memory storage for all generated study
//! artifacts. There is no durable persistence layer; data lives until the
//! session is removed, explicitly cleared, or the process exits.
//!
//! The store is owned by `AppState` and injected into handlers via Axum
//! extractors — it is deliberately not a process-wide singleton. The lock is
//! a synchronous `parking_lot::RwLock` and is never held across an `.await`:
//! callers clone what they need out, do remote work, then re-lock to write.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::activity::ActivityRecord;
use crate::models::flashcard::Flashcard;
use crate::models::note::Note;
use crate::models::quiz::Quiz;

/// Version tag written into whole-session snapshots.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Everything one session has generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    pub notes: Vec<Note>,
    pub flashcards: Vec<Flashcard>,
    pub quizzes: Vec<Quiz>,
    pub activity: Vec<ActivityRecord>,
    #[serde(skip)]
    last_timestamp: Option<DateTime<Utc>>,
}

impl SessionData {
    /// Issues the next entity timestamp for this session.
    ///
    /// Timestamps are monotonically non-decreasing within a session even if
    /// the wall clock steps backwards: a new timestamp is never earlier than
    /// the previously issued one.
    pub fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    /// Distinct categories across notes, flashcards, and quizzes.
    pub fn subjects(&self) -> BTreeSet<String> {
        let mut subjects = BTreeSet::new();
        subjects.extend(self.notes.iter().map(|n| n.category.clone()));
        subjects.extend(self.flashcards.iter().map(|c| c.category.clone()));
        subjects.extend(self.quizzes.iter().map(|q| q.subject.clone()));
        subjects
    }
}

/// Counts returned by the session summary endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub notes_count: usize,
    pub flashcards_count: usize,
    pub quizzes_count: usize,
    pub activity_count: usize,
    pub subjects: Vec<String>,
}

/// Whole-session backup format, exported and re-imported as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub notes: Vec<Note>,
    pub flashcards: Vec<Flashcard>,
    pub quizzes: Vec<Quiz>,
    pub activity: Vec<ActivityRecord>,
}

/// The session-scoped Content Store. Cheap to clone; all clones share the
/// same map.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionData>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.write().insert(id, SessionData::default());
        id
    }

    /// Removes a session and all its data. Returns whether it existed.
    pub fn remove_session(&self, id: Uuid) -> bool {
        self.inner.write().remove(&id).is_some()
    }

    /// Read access to one session's data. Unknown sessions are `NotFound`;
    /// they are never auto-created, so a mistyped id cannot fork state.
    pub fn read<R>(&self, id: Uuid, f: impl FnOnce(&SessionData) -> R) -> Result<R, AppError> {
        let guard = self.inner.read();
        let data = guard
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        Ok(f(data))
    }

    /// Write access to one session's data, same contract as [`read`].
    ///
    /// [`read`]: SessionStore::read
    pub fn write<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionData) -> R,
    ) -> Result<R, AppError> {
        let mut guard = self.inner.write();
        let data = guard
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
        Ok(f(data))
    }

    /// Wipes every collection of one session, keeping the session itself.
    pub fn clear(&self, id: Uuid) -> Result<(), AppError> {
        self.write(id, |data| {
            data.notes.clear();
            data.flashcards.clear();
            data.quizzes.clear();
            data.activity.clear();
        })
    }

    pub fn summary(&self, id: Uuid) -> Result<SessionSummary, AppError> {
        self.read(id, |data| SessionSummary {
            notes_count: data.notes.len(),
            flashcards_count: data.flashcards.len(),
            quizzes_count: data.quizzes.len(),
            activity_count: data.activity.len(),
            subjects: data.subjects().into_iter().collect(),
        })
    }

    pub fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, AppError> {
        self.read(id, |data| SessionSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            exported_at: Utc::now(),
            notes: data.notes.clone(),
            flashcards: data.flashcards.clone(),
            quizzes: data.quizzes.clone(),
            activity: data.activity.clone(),
        })
    }

    /// Replaces a session's collections with a previously exported snapshot.
    /// The snapshot is validated first; an invalid snapshot imports nothing.
    pub fn import_snapshot(&self, id: Uuid, snapshot: SessionSnapshot) -> Result<(), AppError> {
        validate_snapshot(&snapshot)?;

        self.write(id, |data| {
            // Seed the timestamp clock past everything imported so newly
            // issued timestamps keep the monotonicity invariant.
            let mut latest: Option<DateTime<Utc>> = None;
            let mut track = |ts: DateTime<Utc>| {
                if latest.map_or(true, |l| ts > l) {
                    latest = Some(ts);
                }
            };
            snapshot.notes.iter().for_each(|n| track(n.created_at));
            snapshot.flashcards.iter().for_each(|c| track(c.created_at));
            snapshot.quizzes.iter().for_each(|q| track(q.created_at));
            snapshot.activity.iter().for_each(|a| track(a.timestamp));

            data.notes = snapshot.notes;
            data.flashcards = snapshot.flashcards;
            data.quizzes = snapshot.quizzes;
            data.activity = snapshot.activity;
            data.last_timestamp = latest;
        })
    }
}

fn validate_snapshot(snapshot: &SessionSnapshot) -> Result<(), AppError> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(AppError::Validation(format!(
            "Unsupported snapshot version '{}' (expected '{SNAPSHOT_VERSION}')",
            snapshot.version
        )));
    }

    let mut seen = std::collections::HashSet::new();
    let duplicated = snapshot
        .notes
        .iter()
        .map(|n| n.id)
        .chain(snapshot.flashcards.iter().map(|c| c.id))
        .chain(snapshot.quizzes.iter().map(|q| q.id))
        .any(|entity_id| !seen.insert(entity_id));
    if duplicated {
        return Err(AppError::Validation(
            "Snapshot contains duplicate entity ids".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use chrono::Duration;
    use std::io::Write as _;

    fn sample_note(ts: DateTime<Utc>) -> Note {
        Note {
            id: Uuid::new_v4(),
            title: "Osmosis".to_string(),
            source_excerpt: "Water moves across membranes…".to_string(),
            body: "Notes body".to_string(),
            category: "Biology".to_string(),
            note_type: Default::default(),
            detail_level: Default::default(),
            word_count: 2,
            created_at: ts,
        }
    }

    fn sample_card() -> Flashcard {
        Flashcard {
            id: Uuid::new_v4(),
            front: "Define osmosis".to_string(),
            back: "Diffusion of water across a membrane".to_string(),
            category: "Biology".to_string(),
            difficulty: Difficulty::Easy,
            created_at: Utc::now(),
            last_reviewed: None,
            review_history: vec![],
        }
    }

    #[test]
    fn test_unknown_session_is_not_found() {
        let store = SessionStore::new();
        let result = store.read(Uuid::new_v4(), |_| ());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_create_and_remove_session() {
        let store = SessionStore::new();
        let id = store.create_session();
        assert!(store.read(id, |_| ()).is_ok());
        assert!(store.remove_session(id));
        assert!(!store.remove_session(id));
        assert!(store.read(id, |_| ()).is_err());
    }

    #[test]
    fn test_timestamps_are_monotonic() {
        let mut data = SessionData::default();
        let mut previous = data.next_timestamp();
        for _ in 0..100 {
            let ts = data.next_timestamp();
            assert!(ts >= previous);
            previous = ts;
        }
    }

    #[test]
    fn test_timestamp_clamps_to_last_issued_when_clock_steps_back() {
        let mut data = SessionData::default();
        let future = Utc::now() + Duration::hours(1);
        data.last_timestamp = Some(future);
        assert_eq!(data.next_timestamp(), future);
    }

    #[test]
    fn test_clear_keeps_session_alive() {
        let store = SessionStore::new();
        let id = store.create_session();
        store
            .write(id, |data| data.notes.push(sample_note(Utc::now())))
            .unwrap();
        store.clear(id).unwrap();
        let counts = store.summary(id).unwrap();
        assert_eq!(counts.notes_count, 0);
        assert!(store.read(id, |_| ()).is_ok());
    }

    #[test]
    fn test_summary_collects_subjects() {
        let store = SessionStore::new();
        let id = store.create_session();
        store
            .write(id, |data| {
                data.notes.push(sample_note(Utc::now()));
                data.flashcards.push(sample_card());
            })
            .unwrap();
        let summary = store.summary(id).unwrap();
        assert_eq!(summary.subjects, vec!["Biology".to_string()]);
    }

    #[test]
    fn test_snapshot_round_trip_through_file() {
        let store = SessionStore::new();
        let id = store.create_session();
        store
            .write(id, |data| {
                data.notes.push(sample_note(Utc::now()));
                data.flashcards.push(sample_card());
            })
            .unwrap();

        let snapshot = store.snapshot(id).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_vec(&snapshot).unwrap().as_slice())
            .unwrap();

        let restored: SessionSnapshot =
            serde_json::from_slice(&std::fs::read(file.path()).unwrap()).unwrap();
        let other = store.create_session();
        store.import_snapshot(other, restored).unwrap();

        let summary = store.summary(other).unwrap();
        assert_eq!(summary.notes_count, 1);
        assert_eq!(summary.flashcards_count, 1);
    }

    #[test]
    fn test_import_rejects_unknown_version() {
        let store = SessionStore::new();
        let id = store.create_session();
        store
            .write(id, |data| data.notes.push(sample_note(Utc::now())))
            .unwrap();

        let bad = SessionSnapshot {
            version: "0.9".to_string(),
            exported_at: Utc::now(),
            notes: vec![],
            flashcards: vec![],
            quizzes: vec![],
            activity: vec![],
        };
        assert!(store.import_snapshot(id, bad).is_err());
        // Nothing was replaced.
        assert_eq!(store.summary(id).unwrap().notes_count, 1);
    }

    #[test]
    fn test_import_rejects_duplicate_ids() {
        let store = SessionStore::new();
        let id = store.create_session();
        let note = sample_note(Utc::now());
        let mut twin = note.clone();
        twin.title = "Copy".to_string();

        let bad = SessionSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            exported_at: Utc::now(),
            notes: vec![note, twin],
            flashcards: vec![],
            quizzes: vec![],
            activity: vec![],
        };
        assert!(matches!(
            store.import_snapshot(id, bad),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_import_advances_timestamp_clock() {
        let store = SessionStore::new();
        let id = store.create_session();
        let future = Utc::now() + Duration::hours(2);
        let snapshot = SessionSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            exported_at: Utc::now(),
            notes: vec![sample_note(future)],
            flashcards: vec![],
            quizzes: vec![],
            activity: vec![],
        };
        store.import_snapshot(id, snapshot).unwrap();
        let next = store.write(id, |data| data.next_timestamp()).unwrap();
        assert!(next >= future);
    }
}
