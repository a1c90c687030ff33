use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("balance would go negative")]
    NegativeBalance,
}

pub type Result<T> = std::result::Result<T, StateError>;
