pub mod types;
pub mod filter_update;
pub mod filter_where;
pub mod error;

pub use error::FilterError;
pub use filter_update::FilterUpdate;
pub use filter_where::FilterWhere;
pub use types::*;
