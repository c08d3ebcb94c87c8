use crate::db::{InfoStore, StoreSession};
use crate::error::ApiError;
use crate::i18n::LanguageDirectory;
use crate::response::{InfoResponse, PersonalInfo};
use std::sync::Arc;
use tracing::{debug, error};

/// Looks up the personal info record in a requested language.
pub struct InfoReader<S> {
    store: S,
    directory: Arc<LanguageDirectory>,
}

impl<S: InfoStore> InfoReader<S> {
    pub fn new(store: S, directory: Arc<LanguageDirectory>) -> Self {
        Self { store, directory }
    }

    /// Fetch the record for `language` (a code or display name, any case).
    ///
    /// Never fails: every outcome is a status-bearing response.
    pub async fn read(&self, language: &str) -> InfoResponse {
        match self.try_read(language).await {
            Ok(info) => InfoResponse::success(info),
            Err(e) => {
                match &e {
                    ApiError::Persistence(_) | ApiError::Internal(_) => {
                        error!("Failed to read info for '{}': {}", language, e)
                    }
                    _ => debug!("Info lookup for '{}' rejected: {}", language, e),
                }
                InfoResponse::failure(&e)
            }
        }
    }

    async fn try_read(&self, language: &str) -> Result<PersonalInfo, ApiError> {
        let language = self
            .directory
            .resolve(language)
            .ok_or_else(|| ApiError::UnsupportedLanguage(language.to_string()))?;

        let mut session = self.store.begin().await?;
        let (subject, translation) = session
            .find_info(language.name())
            .await?
            .ok_or_else(|| ApiError::NotFound(language.name().to_string()))?;

        Ok(PersonalInfo::new(subject, translation))
    }
}
