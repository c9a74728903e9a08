use anchor_lang::prelude::Pubkey;
use company_vesting::VestingError;

use crate::ledger::{LedgerError, Signature};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Rejected locally by the vesting engine, before any ledger round trip.
    #[error("vesting error: {0}")]
    Vesting(VestingError),

    #[error("account {0} not found")]
    NotFound(Pubkey),

    /// Cached read of an account that has never been fetched.
    #[error("no snapshot of {0} has been fetched yet")]
    StaleRead(Pubkey),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("account {address} could not be decoded: {reason}")]
    Decode { address: Pubkey, reason: String },

    #[error("signature {0} was never submitted")]
    UnknownSubmission(Signature),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<VestingError> for ClientError {
    fn from(e: VestingError) -> Self {
        ClientError::Vesting(e)
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
