//! Business logic services

pub mod borrowers;
pub mod catalog;
pub mod clock;
pub mod loans;
pub mod stats;

use crate::{
    config::LoansConfig,
    error::AppResult,
    repository::Repository,
};

use self::clock::SharedClock;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub borrowers: borrowers::BorrowersService,
    pub loans: loans::LoansService,
    pub stats: stats::StatsService,
    repository: Repository,
}

impl Services {
    /// Create all services over one record store and clock
    pub fn new(repository: Repository, clock: SharedClock, loans_config: &LoansConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            borrowers: borrowers::BorrowersService::new(repository.clone()),
            loans: loans::LoansService::new(
                repository.clone(),
                clock.clone(),
                loans_config.duration_days,
            ),
            stats: stats::StatsService::new(repository.clone(), clock),
            repository,
        }
    }

    /// Check that the record store is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
