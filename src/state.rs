use sqlx::PgPool;

use crate::database::{CompanyRepository, JobRepository, UserRepository};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn companies(&self) -> CompanyRepository {
        CompanyRepository::new(self.pool.clone())
    }

    pub fn jobs(&self) -> JobRepository {
        JobRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }
}
