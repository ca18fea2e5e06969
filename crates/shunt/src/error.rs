use shunt_core::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShuntError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
