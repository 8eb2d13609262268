use fokuslern_core::KeyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BanditError {
    #[error("Invalid value-table key: {0}")]
    Key(#[from] KeyError),
    #[error("Non-finite value {value} for key {key}")]
    NonFiniteValue { key: String, value: f64 },
    #[error("Invalid learning parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, BanditError>;
