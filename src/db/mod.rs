//! Persistence for the personal info record and its translations.
//!
//! Access goes through a session: [`InfoStore::begin`] opens one, the
//! session's queries see and stage changes, and [`StoreSession::commit`]
//! publishes them atomically. A session dropped without `commit` rolls back,
//! so every exit path (including errors) releases it.

mod memory;
mod postgres;

pub use memory::{MemorySession, MemoryStore};
pub use postgres::{PgSession, PgStore};

use chrono::{DateTime, Utc};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A row of `personal_info`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Subject {
    pub id: i32,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `personal_info_translation`.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Translation {
    pub id: i32,
    pub personal_info_id: i32,
    pub language: String,
    pub name: String,
    pub short_info: String,
    pub image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// The mutable text of a translation row.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationFields {
    pub name: String,
    pub short_info: String,
    pub image_url: Option<String>,
}

/// Derive the subject slug from its canonical name: lower-cased, every space
/// replaced with a hyphen.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Entry point to a persistence backend.
pub trait InfoStore: Send + Sync + 'static {
    type Session: StoreSession;

    /// Open a session. The returned session holds its resources until it is
    /// committed or dropped.
    fn begin(&self) -> impl Future<Output = Result<Self::Session, StoreError>> + Send;
}

/// Queries and staged writes within one unit of work.
pub trait StoreSession: Send {
    fn find_subject_by_slug(
        &mut self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Subject>, StoreError>> + Send;

    fn insert_subject(
        &mut self,
        slug: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Subject, StoreError>> + Send;

    /// Set `updated_at` on an existing subject. `None` if it no longer exists.
    fn touch_subject(
        &mut self,
        id: i32,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<Subject>, StoreError>> + Send;

    fn find_translation(
        &mut self,
        subject_id: i32,
        language: &str,
    ) -> impl Future<Output = Result<Option<Translation>, StoreError>> + Send;

    fn insert_translation(
        &mut self,
        subject_id: i32,
        language: &str,
        fields: &TranslationFields,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Translation, StoreError>> + Send;

    /// Overwrite the text of an existing translation. `None` if it no longer
    /// exists.
    fn update_translation(
        &mut self,
        id: i32,
        fields: &TranslationFields,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<Translation>, StoreError>> + Send;

    /// The subject (lowest id first) that has a translation in `language`,
    /// together with that translation.
    fn find_info(
        &mut self,
        language: &str,
    ) -> impl Future<Output = Result<Option<(Subject, Translation)>, StoreError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Ann Lee"), "ann-lee");
        assert_eq!(slugify("Hey This is me"), "hey-this-is-me");
        assert_eq!(slugify("already-slugged"), "already-slugged");
    }

    #[test]
    fn test_slugify_is_deterministic() {
        assert_eq!(slugify("Ann Lee"), slugify("Ann Lee"));
        assert_eq!(slugify("ANN LEE"), slugify("ann lee"));
    }

    #[test]
    fn test_slugify_keeps_each_space() {
        assert_eq!(slugify("Ann  Lee"), "ann--lee");
    }
}
