//! Internationalization (i18n) module: the set of languages the service
//! translates into, and how free-form language tokens map onto it.
//!
//! # Architecture
//!
//! - `directory`: The ordered, immutable list of supported languages with
//!   case-insensitive lookup by code or display name
//! - `language`: A single (display name, code) entry
//!
//! # Example
//!
//! ```rust,ignore
//! use personal_info_api::i18n::LanguageDirectory;
//!
//! let directory = LanguageDirectory::builtin();
//! let french = directory.resolve("FR").unwrap();
//! assert_eq!(french.name(), "French");
//! ```

mod directory;
mod language;

pub use directory::{LanguageDirectory, DEFAULT_LANGUAGE};
pub use language::Language;
