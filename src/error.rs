//! # Error Handling
//!
//! This module defines the centralized error type for the `config_sync`
//! library. It uses the `thiserror` library to build a single `Error` enum
//! covering every failure mode of the synchronization engine, with messages
//! that name the store and configuration item involved.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all errors raised by stores, the comparer, the
//!   merger and the sync manager.
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! An extension that ships no install-time configuration is deliberately not
//! represented here: it simply has nothing to offer and yields an empty
//! changelist.

use thiserror::Error;

/// Main error type for config-sync operations
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration item could not be read from a store.
    #[error("Failed to read '{name}' from {store} storage: {message}")]
    StoreRead {
        store: String,
        name: String,
        message: String,
    },

    /// A configuration item could not be written to or deleted from a store.
    #[error("Failed to write '{name}' to {store} storage: {message}")]
    StoreWrite {
        store: String,
        name: String,
        message: String,
    },

    /// A write was attempted against a read-only store.
    #[error("Storage '{store}' is read-only")]
    ReadOnlyStore { store: String },

    /// A configuration name is not usable as a storage key.
    #[error("Invalid configuration name '{name}': {message}")]
    InvalidName { name: String, message: String },

    /// The site manifest could not be parsed or is incomplete.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the manifest
        hint: Option<String>,
    },

    /// An extension was referenced that is not installed.
    #[error("Extension {extension_type} '{name}' is not installed")]
    UnknownExtension {
        extension_type: String,
        name: String,
    },

    /// Creating a configuration item in the active storage failed.
    #[error("Failed to import {entity_type} '{name}': {message}")]
    Import {
        entity_type: String,
        name: String,
        message: String,
    },

    /// Overwriting a configuration item in the active storage failed.
    #[error("Failed to revert {entity_type} '{name}': {message}")]
    Revert {
        entity_type: String,
        name: String,
        message: String,
    },

    /// A three-way merge could not be carried out.
    #[error("Merge error for '{name}': {message}")]
    Merge { name: String, message: String },

    /// An error indicating that a lock guarding a store has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
