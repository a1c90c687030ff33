//! Transaction model (C6): the `{Emission, Transfer, User, UserUpd}`
//! payload variants, the signed `Transaction` envelope wrapping them, and
//! the execute protocol that ties a committed tx to its `stateUpdates`.

pub mod error;
pub mod payload;
pub mod transaction;

pub use error::{Result, TxError};
pub use payload::{Emission, EmissionOutput, Transfer, TransferOutput, TxData, User, UserUpd};
pub use transaction::{Transaction, VerifyConfig, MAX_DATA_LEN};
