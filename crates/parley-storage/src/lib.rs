//! SQLite-backed persistence for Parley sessions and messages.
//!
//! Exposes the [`SessionGateway`] trait consumed by the dialogue engine and
//! its [`SqliteGateway`] implementation over a WAL-mode SQLite database.

pub mod db;
pub mod error;
pub mod gateway;
pub mod migrations;

pub use db::Database;
pub use error::StoreError;
pub use gateway::{SessionGateway, SqliteGateway};
