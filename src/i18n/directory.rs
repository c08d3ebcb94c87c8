//! Language directory: the ordered set of languages every synchronization
//! translates into.
//!
//! The directory is built once at startup and shared immutably (behind an
//! `Arc`) by the reader and the synchronizer. Lookups are case-insensitive and
//! accept either the language code or its display name.

use crate::i18n::Language;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;

/// Language used when a request does not name one.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Ordered, immutable list of supported languages.
#[derive(Debug, Clone)]
pub struct LanguageDirectory {
    languages: Vec<Language>,
    /// lower-cased code -> index into `languages`
    by_code: HashMap<String, usize>,
    /// lower-cased display name -> index into `languages`
    by_name: HashMap<String, usize>,
}

impl LanguageDirectory {
    /// Build a directory from an ordered list of languages.
    ///
    /// Fails if the list is empty, or if any code or name collides with
    /// another entry once case is ignored.
    pub fn new(languages: Vec<Language>) -> Result<Self> {
        if languages.is_empty() {
            bail!("Language directory must contain at least one language");
        }

        let mut by_code = HashMap::with_capacity(languages.len());
        let mut by_name = HashMap::with_capacity(languages.len());

        for (index, language) in languages.iter().enumerate() {
            let code = language.code().trim().to_lowercase();
            let name = language.name().trim().to_lowercase();

            if code.is_empty() || name.is_empty() {
                bail!("Language entry #{} has an empty name or code", index + 1);
            }
            if by_code.insert(code.clone(), index).is_some() {
                bail!("Duplicate language code: '{}'", language.code());
            }
            if by_name.insert(name, index).is_some() {
                bail!("Duplicate language name: '{}'", language.name());
            }
        }

        // A code equal to another entry's name would make resolution order
        // observable, so reject it outright.
        for (code, &index) in &by_code {
            if let Some(&other) = by_name.get(code) {
                if other != index {
                    bail!(
                        "Language code '{}' collides with the name of '{}'",
                        code,
                        languages[other].name()
                    );
                }
            }
        }

        Ok(Self {
            languages,
            by_code,
            by_name,
        })
    }

    /// The built-in directory used when no override is configured.
    pub fn builtin() -> Self {
        Self::new(default_languages()).expect("built-in language list is valid")
    }

    /// Parse a directory from a `Name:code,Name:code` list.
    ///
    /// # Example
    /// ```ignore
    /// let directory = LanguageDirectory::parse("English:en, French:fr")?;
    /// assert_eq!(directory.len(), 2);
    /// ```
    pub fn parse(list: &str) -> Result<Self> {
        let languages = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (name, code) = entry
                    .split_once(':')
                    .with_context(|| format!("Invalid language entry '{}'. Expected Name:code", entry))?;
                Ok(Language::new(name.trim(), code.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(languages)
    }

    /// Resolve a free-form token (code or display name, any case) to its
    /// directory entry.
    ///
    /// Codes are matched first, then names. There is no partial matching.
    pub fn resolve(&self, token: &str) -> Option<&Language> {
        let key = token.trim().to_lowercase();
        self.by_code
            .get(&key)
            .or_else(|| self.by_name.get(&key))
            .map(|&index| &self.languages[index])
    }

    /// All languages, in directory order.
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Language> {
        self.languages.iter()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

impl<'a> IntoIterator for &'a LanguageDirectory {
    type Item = &'a Language;
    type IntoIter = std::slice::Iter<'a, Language>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Default language list.
fn default_languages() -> Vec<Language> {
    vec![
        Language::new("English", "en"),
        Language::new("Urdu", "ur"),
        Language::new("Arabic", "ar"),
        Language::new("French", "fr"),
        Language::new("Spanish", "es"),
        Language::new("German", "de"),
        Language::new("Chinese", "zh"),
        Language::new("Hindi", "hi"),
    ]
}
