pub mod company;
pub mod job;
pub mod user;

pub use company::{Company, CompanyDetail, NewCompany};
pub use job::{Job, JobSummary, NewJob};
pub use user::{NewUser, User, UserDetail, UserWithPassword};
