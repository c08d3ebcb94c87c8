use super::{InfoStore, StoreError, StoreSession, Subject, Translation, TranslationFields};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::info;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables if they do not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS personal_info (
                id SERIAL PRIMARY KEY,
                slug TEXT NOT NULL UNIQUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create personal_info table")?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS personal_info_translation (
                id SERIAL PRIMARY KEY,
                personal_info_id INTEGER NOT NULL
                    REFERENCES personal_info(id) ON DELETE CASCADE,
                language TEXT NOT NULL,
                name TEXT NOT NULL,
                short_info TEXT NOT NULL,
                image_url TEXT,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                UNIQUE (personal_info_id, language)
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create personal_info_translation table")?;

        info!("Database schema ready");
        Ok(())
    }
}

impl InfoStore for PgStore {
    type Session = PgSession;

    async fn begin(&self) -> Result<PgSession, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgSession { tx })
    }
}

/// One database transaction. Dropping it without `commit` rolls back.
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

#[derive(sqlx::FromRow)]
struct InfoRow {
    id: i32,
    slug: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    translation_id: i32,
    language: String,
    name: String,
    short_info: String,
    image_url: Option<String>,
    translation_updated_at: DateTime<Utc>,
}

impl InfoRow {
    fn split(self) -> (Subject, Translation) {
        (
            Subject {
                id: self.id,
                slug: self.slug,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            Translation {
                id: self.translation_id,
                personal_info_id: self.id,
                language: self.language,
                name: self.name,
                short_info: self.short_info,
                image_url: self.image_url,
                updated_at: self.translation_updated_at,
            },
        )
    }
}

impl StoreSession for PgSession {
    async fn find_subject_by_slug(&mut self, slug: &str) -> Result<Option<Subject>, StoreError> {
        let subject = sqlx::query_as::<_, Subject>(
            "SELECT id, slug, created_at, updated_at FROM personal_info WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(subject)
    }

    async fn insert_subject(&mut self, slug: &str, now: DateTime<Utc>) -> Result<Subject, StoreError> {
        let subject = sqlx::query_as::<_, Subject>(
            "INSERT INTO personal_info (slug, created_at, updated_at)
             VALUES ($1, $2, $2)
             RETURNING id, slug, created_at, updated_at",
        )
        .bind(slug)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(subject)
    }

    async fn touch_subject(&mut self, id: i32, now: DateTime<Utc>) -> Result<Option<Subject>, StoreError> {
        let subject = sqlx::query_as::<_, Subject>(
            "UPDATE personal_info SET updated_at = $2 WHERE id = $1
             RETURNING id, slug, created_at, updated_at",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(subject)
    }

    async fn find_translation(
        &mut self,
        subject_id: i32,
        language: &str,
    ) -> Result<Option<Translation>, StoreError> {
        let translation = sqlx::query_as::<_, Translation>(
            "SELECT id, personal_info_id, language, name, short_info, image_url, updated_at
             FROM personal_info_translation
             WHERE personal_info_id = $1 AND language = $2",
        )
        .bind(subject_id)
        .bind(language)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(translation)
    }

    async fn insert_translation(
        &mut self,
        subject_id: i32,
        language: &str,
        fields: &TranslationFields,
        now: DateTime<Utc>,
    ) -> Result<Translation, StoreError> {
        let translation = sqlx::query_as::<_, Translation>(
            "INSERT INTO personal_info_translation
                (personal_info_id, language, name, short_info, image_url, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, personal_info_id, language, name, short_info, image_url, updated_at",
        )
        .bind(subject_id)
        .bind(language)
        .bind(&fields.name)
        .bind(&fields.short_info)
        .bind(&fields.image_url)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(translation)
    }

    async fn update_translation(
        &mut self,
        id: i32,
        fields: &TranslationFields,
        now: DateTime<Utc>,
    ) -> Result<Option<Translation>, StoreError> {
        let translation = sqlx::query_as::<_, Translation>(
            "UPDATE personal_info_translation
             SET name = $2, short_info = $3, image_url = $4, updated_at = $5
             WHERE id = $1
             RETURNING id, personal_info_id, language, name, short_info, image_url, updated_at",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.short_info)
        .bind(&fields.image_url)
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(translation)
    }

    async fn find_info(&mut self, language: &str) -> Result<Option<(Subject, Translation)>, StoreError> {
        let row = sqlx::query_as::<_, InfoRow>(
            "SELECT p.id, p.slug, p.created_at, p.updated_at,
                    t.id AS translation_id, t.language, t.name, t.short_info, t.image_url,
                    t.updated_at AS translation_updated_at
             FROM personal_info p
             JOIN personal_info_translation t ON t.personal_info_id = p.id
             WHERE t.language = $1
             ORDER BY p.id
             LIMIT 1",
        )
        .bind(language)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(InfoRow::split))
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
