use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("No data to update")]
    NoFieldsToUpdate,

    #[error("Invalid filter field: {0}")]
    InvalidFilterField(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),
}
