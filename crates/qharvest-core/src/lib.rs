//! Shared domain types, store interfaces, and configuration for qharvest.
//!
//! The collection subsystem (`qharvest-collect`) and the sqlite stores
//! (`qharvest-db`) both depend on this crate; it holds everything they need
//! to agree on without depending on each other.

pub mod app_config;
pub mod config;
pub mod store;
pub mod types;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use store::{AnswerStore, NewAnswer, NewProblem, ProblemRecord, ProblemStore, StoreError};
pub use types::{CollectedAnswer, CollectedQuestion, CollectionConfig};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("topic must not be empty")]
    EmptyTopic,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
