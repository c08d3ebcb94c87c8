use crate::i18n::{LanguageDirectory, DEFAULT_LANGUAGE};
use anyhow::{bail, Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // OpenAI
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,

    // Translation
    pub translation_timeout: Duration,
    pub parallel_translations: bool,
    /// `Name:code,...` override for the built-in language list
    pub supported_languages: Option<String>,

    // Server
    pub port: u16,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Database
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            // OpenAI - a missing key is reported per request, not at startup
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),

            // Translation
            translation_timeout: Duration::from_secs(
                std::env::var("TRANSLATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|&secs: &u64| secs > 0)
                    .unwrap_or(30),
            ),
            parallel_translations: std::env::var("PARALLEL_TRANSLATIONS")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(false),
            supported_languages: std::env::var("SUPPORTED_LANGUAGES")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            // Server
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            debug: std::env::var("DEBUG")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(true),
        })
    }

    /// Build the language directory this configuration describes.
    ///
    /// An override must include [`DEFAULT_LANGUAGE`]: requests that name no
    /// language fall back to it.
    pub fn language_directory(&self) -> Result<LanguageDirectory> {
        let Some(list) = &self.supported_languages else {
            return Ok(LanguageDirectory::builtin());
        };

        let directory = LanguageDirectory::parse(list).context("Invalid SUPPORTED_LANGUAGES")?;
        if directory.resolve(DEFAULT_LANGUAGE).is_none() {
            bail!(
                "Invalid SUPPORTED_LANGUAGES: must include the default language {}",
                DEFAULT_LANGUAGE
            );
        }
        Ok(directory)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "DATABASE_URL",
        "DATABASE_MAX_CONNECTIONS",
        "OPENAI_API_KEY",
        "OPENAI_MODEL",
        "OPENAI_API_URL",
        "TRANSLATION_TIMEOUT_SECS",
        "PARALLEL_TRANSLATIONS",
        "SUPPORTED_LANGUAGES",
        "PORT",
        "DEBUG",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    // ==================== from_env Tests ====================

    #[test]
    #[serial]
    fn test_from_env_requires_database_url() {
        clear_env();
        let result = Config::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("DATABASE_URL"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/info");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.database_url, "postgres://localhost/info");
        assert_eq!(config.database_max_connections, 5);
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(
            config.openai_api_url,
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(config.translation_timeout, Duration::from_secs(30));
        assert!(!config.parallel_translations);
        assert!(config.supported_languages.is_none());
        assert_eq!(config.port, 8000);
        assert!(config.debug);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://db/info");
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("TRANSLATION_TIMEOUT_SECS", "5");
        std::env::set_var("PARALLEL_TRANSLATIONS", "YES");
        std::env::set_var("PORT", "9090");
        std::env::set_var("DEBUG", "False");
        std::env::set_var("SUPPORTED_LANGUAGES", "English:en,French:fr");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.translation_timeout, Duration::from_secs(5));
        assert!(config.parallel_translations);
        assert_eq!(config.port, 9090);
        assert!(!config.debug);

        let directory = config.language_directory().expect("valid directory");
        assert_eq!(directory.len(), 2);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_blank_api_key_and_bad_numbers() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://db/info");
        std::env::set_var("OPENAI_API_KEY", "   ");
        std::env::set_var("TRANSLATION_TIMEOUT_SECS", "0");
        std::env::set_var("PORT", "not-a-port");

        let config = Config::from_env().expect("Should load");
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.translation_timeout, Duration::from_secs(30));
        assert_eq!(config.port, 8000);

        clear_env();
    }

    // ==================== language_directory Tests ====================

    #[test]
    #[serial]
    fn test_language_directory_defaults_to_builtin() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://db/info");
        let config = Config::from_env().expect("Should load");
        let directory = config.language_directory().expect("builtin");
        assert_eq!(directory.len(), LanguageDirectory::builtin().len());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_language_directory_invalid_override() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://db/info");
        std::env::set_var("SUPPORTED_LANGUAGES", "English");
        let config = Config::from_env().expect("Should load");
        let err = config.language_directory().unwrap_err();
        assert!(err.to_string().contains("SUPPORTED_LANGUAGES"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_language_directory_override_requires_default_language() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://db/info");
        std::env::set_var("SUPPORTED_LANGUAGES", "French:fr,Urdu:ur");
        let config = Config::from_env().expect("Should load");

        let err = config.language_directory().unwrap_err();
        assert!(err.to_string().contains("default language English"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_language_directory_override_with_default_in_any_position() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://db/info");
        std::env::set_var("SUPPORTED_LANGUAGES", "Urdu:ur,english:en");
        let config = Config::from_env().expect("Should load");

        let directory = config.language_directory().expect("valid directory");
        assert_eq!(directory.len(), 2);
        clear_env();
    }

    // ==================== parse_bool Tests ====================

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool(" no "), Some(false));
        assert_eq!(parse_bool("FALSE"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
