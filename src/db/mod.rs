//! Persistence layer: repository ports and implementations.
//!
//! The scheduling core talks to storage exclusively through the port traits
//! in [`repository`]. The module follows a layered architecture:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Surrounding administration system (REST handlers, etc) │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service layer (services::*) - scheduling, capacity,    │
//! │  enrollment orchestration                               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Port traits (db::repository) - abstract interface      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                 │
//!     │               (in-memory)                    │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! Deployments with a relational store implement the same traits over
//! their engine; the two consistency obligations (atomic seat CAS and
//! authoritative slot uniqueness in `save_occurrence`) map directly to a
//! conditional `UPDATE` and a composite unique index.

pub mod error;
pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
pub use repository::{
    CampusRepository, EnrollmentRepository, OfferingRepository, ScheduleRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn CampusRepository>> = OnceLock::new();

/// Initialize the global repository singleton from the environment.
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }
    let repo = RepositoryFactory::from_env().map_err(|e| anyhow::Error::msg(e.to_string()))?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn CampusRepository>> {
    if REPOSITORY.get().is_none() {
        let _ = init_repository();
    }

    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_global_repository_initializes_once() {
        init_repository().unwrap();
        let repo = get_repository().unwrap();
        assert!(repo.health_check().await.unwrap());

        // Re-initialization is a no-op; the same instance is returned.
        init_repository().unwrap();
        let again = get_repository().unwrap();
        assert!(Arc::ptr_eq(repo, again));
    }
}
