//! # adsync-store
//!
//! Persistence for local ad records.
//!
//! The [`AdRecordStore`] trait is the only thing the sync coordinator sees.
//! Two backends implement it: [`MemoryAdStore`] for development and tests,
//! and [`SqliteAdStore`], a `rusqlite` database with versioned migrations.
//! The [`Directory`] holds the externally owned vehicles and users that ads
//! are built from.

pub mod ads;
pub mod database;
pub mod directory;
pub mod memory;
pub mod migrations;
pub mod store;

mod error;

pub use ads::SqliteAdStore;
pub use database::Database;
pub use directory::{Directory, DirectorySeed};
pub use error::StoreError;
pub use memory::MemoryAdStore;
pub use store::{AdRecordPatch, AdRecordStore, NewAdRecord};
