//! Paginated record storage for the dmail service.
//! This crate owns the data model, SQL construction and SQLite sessions.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{ConfigError, DbConfig, LogConfig, ServiceConfig, SynchronousMode};
pub use db::{open_pool, DbError, DbPool};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::entity::{Entity, ValidationError};
pub use model::mall::Mall;
pub use model::pagination::{PageMode, PaginationFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use model::record::Record;
pub use model::user::User;
pub use repo::record_repo::{RecordRepository, RepoError, RepoResult, SqliteRecordRepository};
pub use service::record_service::{MallService, RecordService, UserService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
