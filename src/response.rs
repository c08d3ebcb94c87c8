//! JSON bodies returned by the info endpoints.
//!
//! Every body carries its own `status_code`; the HTTP layer mirrors it onto
//! the transport status.

use crate::db::{Subject, Translation};
use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One language's text, as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub language: String,
    pub name: String,
    pub short_info: String,
    pub image_url: Option<String>,
}

impl From<Translation> for TranslationEntry {
    fn from(translation: Translation) -> Self {
        Self {
            language: translation.language,
            name: translation.name,
            short_info: translation.short_info,
            image_url: translation.image_url,
        }
    }
}

/// The personal info record in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub id: i32,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub translation: TranslationEntry,
}

impl PersonalInfo {
    pub fn new(subject: Subject, translation: Translation) -> Self {
        Self {
            id: subject.id,
            slug: subject.slug,
            created_at: subject.created_at,
            updated_at: subject.updated_at,
            translation: translation.into(),
        }
    }
}

/// Body of `GET /api/v1/info/{language}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoResponse {
    pub status_code: u16,
    pub message: String,
    pub data: Option<PersonalInfo>,
}

impl InfoResponse {
    pub fn success(info: PersonalInfo) -> Self {
        Self {
            status_code: 200,
            message: format!("fetched successfully for {}", info.translation.language),
            data: Some(info),
        }
    }

    pub fn failure(error: &ApiError) -> Self {
        Self {
            status_code: error.status_code(),
            message: error.to_string(),
            data: None,
        }
    }
}

/// Body of `POST /api/v1/info/translate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub status_code: u16,
    pub message: String,
    pub translated_into: usize,
    pub translations: Vec<TranslationEntry>,
}

impl SyncResponse {
    pub fn success(translations: Vec<TranslationEntry>) -> Self {
        Self {
            status_code: 200,
            message: "translations fetched successfully".to_string(),
            translated_into: translations.len(),
            translations,
        }
    }

    pub fn failure(error: &ApiError) -> Self {
        Self {
            status_code: error.status_code(),
            message: error.to_string(),
            translated_into: 0,
            translations: Vec::new(),
        }
    }
}
