//! Language type: one entry of the language directory.

/// A supported language.
///
/// The display name (e.g. "French") is what gets persisted on translation
/// rows and reported in responses; the code (e.g. "fr") is an accepted alias
/// when resolving request tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    name: String,
    code: String,
}

impl Language {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }

    /// Display name of the language (e.g. "English", "Urdu").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short language code (e.g. "en", "ur").
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
