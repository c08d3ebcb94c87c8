pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod info;
pub mod response;
pub mod retry;
pub mod server;
pub mod sync;
pub mod translation;
