pub mod bind;
pub mod company;
pub mod job;
pub mod manager;
pub mod models;
pub mod repository;
pub mod user;

pub use company::CompanyRepository;
pub use job::JobRepository;
pub use manager::{DatabaseError, DatabaseManager};
pub use repository::Repository;
pub use user::UserRepository;
