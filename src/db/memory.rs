use super::{InfoStore, StoreError, StoreSession, Subject, Translation, TranslationFields};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// In-process store with the same session semantics as [`super::PgStore`]:
/// a session works on a private copy of the data and `commit` swaps it in.
///
/// Concurrent sessions are not isolated from each other's commits (last
/// commit wins), which is fine for local runs and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    offline: Arc<AtomicBool>,
}

#[derive(Clone, Default)]
struct MemoryState {
    subjects: Vec<Subject>,
    translations: Vec<Translation>,
    next_subject_id: i32,
    next_translation_id: i32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `begin` fail with [`StoreError::Unavailable`] while `offline`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Committed subjects.
    pub fn subjects(&self) -> Vec<Subject> {
        self.lock().map(|s| s.subjects.clone()).unwrap_or_default()
    }

    /// Committed translations, in insertion order.
    pub fn translations(&self) -> Vec<Translation> {
        self.lock().map(|s| s.translations.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl InfoStore for MemoryStore {
    type Session = MemorySession;

    async fn begin(&self) -> Result<MemorySession, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }

        let working = self.lock()?.clone();
        Ok(MemorySession {
            store: self.clone(),
            working,
        })
    }
}

pub struct MemorySession {
    store: MemoryStore,
    working: MemoryState,
}

impl StoreSession for MemorySession {
    async fn find_subject_by_slug(&mut self, slug: &str) -> Result<Option<Subject>, StoreError> {
        Ok(self.working.subjects.iter().find(|s| s.slug == slug).cloned())
    }

    async fn insert_subject(&mut self, slug: &str, now: DateTime<Utc>) -> Result<Subject, StoreError> {
        if self.working.subjects.iter().any(|s| s.slug == slug) {
            return Err(StoreError::Constraint(format!(
                "personal_info.slug '{}' already exists",
                slug
            )));
        }

        self.working.next_subject_id += 1;
        let subject = Subject {
            id: self.working.next_subject_id,
            slug: slug.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.working.subjects.push(subject.clone());
        Ok(subject)
    }

    async fn touch_subject(&mut self, id: i32, now: DateTime<Utc>) -> Result<Option<Subject>, StoreError> {
        Ok(self
            .working
            .subjects
            .iter_mut()
            .find(|s| s.id == id)
            .map(|subject| {
                subject.updated_at = now;
                subject.clone()
            }))
    }

    async fn find_translation(
        &mut self,
        subject_id: i32,
        language: &str,
    ) -> Result<Option<Translation>, StoreError> {
        Ok(self
            .working
            .translations
            .iter()
            .find(|t| t.personal_info_id == subject_id && t.language == language)
            .cloned())
    }

    async fn insert_translation(
        &mut self,
        subject_id: i32,
        language: &str,
        fields: &TranslationFields,
        now: DateTime<Utc>,
    ) -> Result<Translation, StoreError> {
        if !self.working.subjects.iter().any(|s| s.id == subject_id) {
            return Err(StoreError::Constraint(format!(
                "personal_info {} does not exist",
                subject_id
            )));
        }
        if self
            .working
            .translations
            .iter()
            .any(|t| t.personal_info_id == subject_id && t.language == language)
        {
            return Err(StoreError::Constraint(format!(
                "translation ({}, {}) already exists",
                subject_id, language
            )));
        }

        self.working.next_translation_id += 1;
        let translation = Translation {
            id: self.working.next_translation_id,
            personal_info_id: subject_id,
            language: language.to_string(),
            name: fields.name.clone(),
            short_info: fields.short_info.clone(),
            image_url: fields.image_url.clone(),
            updated_at: now,
        };
        self.working.translations.push(translation.clone());
        Ok(translation)
    }

    async fn update_translation(
        &mut self,
        id: i32,
        fields: &TranslationFields,
        now: DateTime<Utc>,
    ) -> Result<Option<Translation>, StoreError> {
        Ok(self
            .working
            .translations
            .iter_mut()
            .find(|t| t.id == id)
            .map(|translation| {
                translation.name = fields.name.clone();
                translation.short_info = fields.short_info.clone();
                translation.image_url = fields.image_url.clone();
                translation.updated_at = now;
                translation.clone()
            }))
    }

    async fn find_info(&mut self, language: &str) -> Result<Option<(Subject, Translation)>, StoreError> {
        let mut subjects: Vec<&Subject> = self.working.subjects.iter().collect();
        subjects.sort_by_key(|s| s.id);

        Ok(subjects.into_iter().find_map(|subject| {
            self.working
                .translations
                .iter()
                .find(|t| t.personal_info_id == subject.id && t.language == language)
                .map(|t| (subject.clone(), t.clone()))
        }))
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut state = self.store.lock()?;
        *state = self.working;
        Ok(())
    }
}
