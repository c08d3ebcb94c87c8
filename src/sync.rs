//! Translation synchronization: regenerate every language's copy of the
//! personal info record from one freshly supplied canonical text.
//!
//! Everything happens inside one store session:
//!
//! 1. The subject is found by slug (or created).
//! 2. The provider is asked for each directory language. A failed,
//!    timed-out or unparseable reply degrades to the canonical
//!    (untranslated) text for that language only.
//! 3. Each language's row is updated in place (or inserted), and everything
//!    is committed at once.
//!
//! Faults outside the per-language boundary (invalid input, provider
//! connection, storage) abort the whole synchronization with nothing
//! committed.

use crate::config::Config;
use crate::db::{slugify, InfoStore, StoreSession, Subject, TranslationFields};
use crate::error::ApiError;
use crate::i18n::{Language, LanguageDirectory, DEFAULT_LANGUAGE};
use crate::response::{SyncResponse, TranslationEntry};
use crate::translation::{ProviderError, TranslationClient, TranslationProvider};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Body of `POST /api/v1/info/translate`, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslatePayload {
    pub name: Option<String>,
    pub short_info: Option<String>,
    /// Language the canonical text is written in; defaults to English.
    pub local: Option<String>,
    pub image_url: Option<String>,
}

impl TranslatePayload {
    pub fn new(name: impl Into<String>, short_info: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            short_info: Some(short_info.into()),
            ..Self::default()
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_local(mut self, local: impl Into<String>) -> Self {
        self.local = Some(local.into());
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Upper bound for one provider call, retries included
    pub timeout: Duration,
    /// Ask the provider for all languages concurrently
    pub parallel: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            parallel: false,
        }
    }
}

impl From<&Config> for SyncOptions {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.translation_timeout,
            parallel: config.parallel_translations,
        }
    }
}

/// Validated canonical text.
#[derive(Debug, Clone)]
struct CanonicalText {
    name: String,
    short_info: String,
    source: Language,
    image_url: Option<String>,
}

impl CanonicalText {
    fn untranslated(&self) -> TranslatedText {
        TranslatedText {
            name: self.name.clone(),
            short_info: self.short_info.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TranslatedText {
    name: String,
    short_info: String,
}

/// Fields recovered from a provider reply. A key that is absent, not a
/// string, or blank is `None`.
#[derive(Debug, Default, PartialEq)]
struct ParsedTranslation {
    name: Option<String>,
    short_info: Option<String>,
}

impl ParsedTranslation {
    fn or_canonical(self, canonical: &CanonicalText) -> TranslatedText {
        TranslatedText {
            name: self.name.unwrap_or_else(|| canonical.name.clone()),
            short_info: self.short_info.unwrap_or_else(|| canonical.short_info.clone()),
        }
    }
}

fn code_fence() -> &'static Regex {
    static CODE_FENCE: OnceLock<Regex> = OnceLock::new();
    CODE_FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").expect("code fence pattern is valid")
    })
}

/// Parse a provider reply into translated fields.
///
/// Returns `None` when the reply is not a JSON object (after unwrapping an
/// optional Markdown code fence).
fn parse_translation(raw: &str) -> Option<ParsedTranslation> {
    let body = code_fence()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str());

    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    let object = value.as_object()?;

    let field = |key: &str| {
        object
            .get(key)
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(ParsedTranslation {
        name: field("name"),
        short_info: field("short_info"),
    })
}

/// Keeps the persisted translations of the personal info record in sync
/// with the canonical text.
pub struct Synchronizer<S, P> {
    store: S,
    provider: P,
    directory: Arc<LanguageDirectory>,
    options: SyncOptions,
}

impl<S: InfoStore, P: TranslationProvider> Synchronizer<S, P> {
    pub fn new(store: S, provider: P, directory: Arc<LanguageDirectory>) -> Self {
        Self {
            store,
            provider,
            directory,
            options: SyncOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    /// Regenerate all translations from `payload`.
    ///
    /// Never fails: every outcome is a status-bearing response.
    pub async fn synchronize(&self, payload: TranslatePayload) -> SyncResponse {
        match self.try_synchronize(payload).await {
            Ok(entries) => SyncResponse::success(entries),
            Err(e) => {
                match &e {
                    ApiError::InvalidInput { reason } => {
                        debug!("Rejected translate request: {}", reason)
                    }
                    ApiError::MissingField(_) => debug!("Rejected translate request: {}", e),
                    _ => error!("Synchronization failed: {}", e),
                }
                SyncResponse::failure(&e)
            }
        }
    }

    async fn try_synchronize(
        &self,
        payload: TranslatePayload,
    ) -> Result<Vec<TranslationEntry>, ApiError> {
        let text = self.validate(payload)?;
        let slug = slugify(&text.name);
        let client = self.provider.connect()?;

        let now = Utc::now();
        let mut session = self.store.begin().await?;
        let subject = locate_subject(&mut session, &slug, now).await?;

        info!(
            "Synchronizing '{}' (id {}) into {} languages",
            slug,
            subject.id,
            self.directory.len()
        );

        let translated = self.translate_all(&client, &text).await;
        let entries = self
            .store_translations(&mut session, &subject, &text, translated, now)
            .await?;

        session.commit().await?;
        info!(
            "Committed {} translations for '{}' (id {})",
            entries.len(),
            slug,
            subject.id
        );

        Ok(entries)
    }

    /// Canonical fields are kept exactly as sent; trimming only decides
    /// whether `name` is blank.
    fn validate(&self, payload: TranslatePayload) -> Result<CanonicalText, ApiError> {
        let name = payload.name.ok_or(ApiError::MissingField("name"))?;
        let short_info = payload
            .short_info
            .ok_or(ApiError::MissingField("short_info"))?;

        if name.trim().is_empty() {
            return Err(ApiError::invalid_input("`name` is blank"));
        }

        let local = payload.local.as_deref().unwrap_or(DEFAULT_LANGUAGE);
        let source = self
            .directory
            .resolve(local)
            .cloned()
            .ok_or_else(|| ApiError::invalid_input(format!("language '{}' is not supported", local)))?;

        Ok(CanonicalText {
            name,
            short_info,
            source,
            image_url: payload.image_url,
        })
    }

    /// One result per directory language, in directory order.
    async fn translate_all(&self, client: &P::Client, text: &CanonicalText) -> Vec<TranslatedText> {
        if self.options.parallel {
            let calls: Vec<_> = self
                .directory
                .iter()
                .map(|language| self.translate_one(client, text, language))
                .collect();
            join_all(calls).await
        } else {
            let mut translated = Vec::with_capacity(self.directory.len());
            for language in &*self.directory {
                translated.push(self.translate_one(client, text, language).await);
            }
            translated
        }
    }

    async fn translate_one(
        &self,
        client: &P::Client,
        text: &CanonicalText,
        target: &Language,
    ) -> TranslatedText {
        let call = client.translate(&text.name, &text.short_info, &text.source, target);
        let outcome = match tokio::time::timeout(self.options.timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderError::Timeout(self.options.timeout)),
        };

        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "Translation to {} failed, keeping canonical text: {}",
                    target, e
                );
                return text.untranslated();
            }
        };

        match parse_translation(&raw) {
            Some(parsed) => parsed.or_canonical(text),
            None => {
                warn!(
                    "Unparseable translation reply for {}, keeping canonical text: {:?}",
                    target, raw
                );
                text.untranslated()
            }
        }
    }

    async fn store_translations(
        &self,
        session: &mut S::Session,
        subject: &Subject,
        text: &CanonicalText,
        translated: Vec<TranslatedText>,
        now: DateTime<Utc>,
    ) -> Result<Vec<TranslationEntry>, ApiError> {
        let mut entries = Vec::with_capacity(self.directory.len());
        for (language, translated) in self.directory.iter().zip(translated) {
            let fields = TranslationFields {
                name: translated.name,
                short_info: translated.short_info,
                image_url: text.image_url.clone(),
            };

            let row = match session.find_translation(subject.id, language.name()).await? {
                Some(existing) => session
                    .update_translation(existing.id, &fields, now)
                    .await?
                    .ok_or_else(|| {
                        ApiError::Internal(format!(
                            "{} translation of '{}' vanished while updating",
                            language, subject.slug
                        ))
                    })?,
                None => {
                    session
                        .insert_translation(subject.id, language.name(), &fields, now)
                        .await?
                }
            };
            entries.push(TranslationEntry::from(row));
        }

        Ok(entries)
    }
}

/// Find the subject by slug and mark it updated, or create it.
async fn locate_subject<T: StoreSession>(
    session: &mut T,
    slug: &str,
    now: DateTime<Utc>,
) -> Result<Subject, ApiError> {
    match session.find_subject_by_slug(slug).await? {
        Some(existing) => session.touch_subject(existing.id, now).await?.ok_or_else(|| {
            ApiError::Internal(format!("personal info '{}' vanished while updating", slug))
        }),
        None => Ok(session.insert_subject(slug, now).await?),
    }
}
