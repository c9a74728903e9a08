//! Boundary to the ledger that executes vesting instructions and stores
//! account bytes. Encoding and consensus live on the other side of this trait.

use std::fmt;

use anchor_lang::prelude::{borsh, AnchorDeserialize, AnchorSerialize, Pubkey};
use anchor_lang::Discriminator;
use company_vesting::{EmployeeAccount, VestingAccount};

/// Transaction identifier handed out on submission.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature(pub [u8; 32]);

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

/// Mutations understood by the vesting program.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum VestingInstruction {
    CreateVestingAccount {
        signer: Pubkey,
        mint: Pubkey,
        company_name: String,
    },
    CreateEmployeeAccount {
        owner: Pubkey,
        vesting_account: Pubkey,
        beneficiary: Pubkey,
        start_time: i64,
        end_time: i64,
        total_amount: u64,
        cliff_time: i64,
    },
    ClaimTokens {
        beneficiary: Pubkey,
        employee_account: Pubkey,
        company_name: String,
    },
}

/// Decoded program events attached to a confirmed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEvent {
    VestingAccountCreated {
        vesting_account: Pubkey,
        owner: Pubkey,
        treasury_token_account: Pubkey,
        company_name: String,
    },
    EmployeeAccountCreated {
        employee_account: Pubkey,
        vesting_account: Pubkey,
        beneficiary: Pubkey,
    },
    TokensClaimed {
        employee_account: Pubkey,
        vesting_account: Pubkey,
        beneficiary: Pubkey,
        amount: u64,
        total_withdrawn: u64,
        time: i64,
    },
}

impl LedgerEvent {
    /// Program accounts whose bytes changed because of this event.
    pub fn touched(&self) -> Vec<Pubkey> {
        match self {
            LedgerEvent::VestingAccountCreated {
                vesting_account, ..
            } => vec![*vesting_account],
            LedgerEvent::EmployeeAccountCreated {
                employee_account, ..
            } => vec![*employee_account],
            LedgerEvent::TokensClaimed {
                employee_account, ..
            } => vec![*employee_account],
        }
    }

    /// Company the event belongs to.
    pub fn company(&self) -> Pubkey {
        match self {
            LedgerEvent::VestingAccountCreated {
                vesting_account, ..
            }
            | LedgerEvent::EmployeeAccountCreated {
                vesting_account, ..
            }
            | LedgerEvent::TokensClaimed {
                vesting_account, ..
            } => *vesting_account,
        }
    }
}

/// A confirmed event with the transaction and ledger time it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityEntry {
    pub signature: Signature,
    pub at: i64,
    pub event: LedgerEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Accepted for ordering, not executed yet.
    Pending,
    Confirmed { events: Vec<LedgerEvent> },
    Failed { error: LedgerError },
}

/// Opaque failure reported by the ledger. The client never interprets or retries these.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("account {0} already in use")]
    AlreadyInUse(Pubkey),

    #[error("account {0} not found")]
    AccountNotFound(Pubkey),

    #[error("program error {name}: {message}")]
    Program { name: String, message: String },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// An account does not sit at the address its seeds derive to.
    pub fn seeds_violation() -> Self {
        LedgerError::Program {
            name: "ConstraintSeeds".to_string(),
            message: "A seeds constraint was violated".to_string(),
        }
    }
}

impl From<company_vesting::VestingError> for LedgerError {
    fn from(e: company_vesting::VestingError) -> Self {
        LedgerError::Program {
            name: format!("{e:?}"),
            message: e.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountKind {
    VestingAccount,
    EmployeeAccount,
}

impl AccountKind {
    pub fn discriminator(self) -> &'static [u8] {
        match self {
            AccountKind::VestingAccount => VestingAccount::DISCRIMINATOR,
            AccountKind::EmployeeAccount => EmployeeAccount::DISCRIMINATOR,
        }
    }

    pub fn matches(self, data: &[u8]) -> bool {
        data.starts_with(self.discriminator())
    }
}

/// Byte comparison against raw account data, discriminator included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountFilter {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl AccountFilter {
    /// Vesting accounts whose `owner` is `owner`.
    pub fn owned_by(owner: &Pubkey) -> Self {
        Self {
            offset: 8,
            bytes: owner.to_bytes().to_vec(),
        }
    }

    /// Employee accounts whose `vesting_account` is `company`.
    pub fn employees_of(company: &Pubkey) -> Self {
        Self {
            offset: 8 + 32,
            bytes: company.to_bytes().to_vec(),
        }
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        data.get(self.offset..self.offset + self.bytes.len()) == Some(self.bytes.as_slice())
    }
}

/// Account bytes as read at ledger time `fetched_at`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub address: Pubkey,
    pub data: Vec<u8>,
    pub fetched_at: i64,
}

pub trait Ledger: Send + Sync {
    /// Queue an instruction. Returns once the ledger has accepted it for ordering.
    fn submit(
        &self,
        instruction: VestingInstruction,
    ) -> std::result::Result<Signature, LedgerError>;

    /// `None` when the signature was never submitted to this ledger.
    fn status(&self, signature: &Signature) -> Option<TransactionStatus>;

    fn fetch_account(
        &self,
        address: &Pubkey,
    ) -> std::result::Result<Option<AccountSnapshot>, LedgerError>;

    fn list_accounts(
        &self,
        kind: AccountKind,
        filters: &[AccountFilter],
    ) -> std::result::Result<Vec<AccountSnapshot>, LedgerError>;

    /// Ledger clock, unix seconds.
    fn current_time(&self) -> i64;

    /// Events of every confirmed transaction, oldest first.
    fn activity(&self) -> std::result::Result<Vec<ActivityEntry>, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_compare_at_offset() {
        let company = Pubkey::new_unique();
        let mut data = vec![0u8; 8 + 32 + 32];
        data[40..72].copy_from_slice(company.as_ref());

        assert!(AccountFilter::employees_of(&company).matches(&data));
        assert!(!AccountFilter::owned_by(&company).matches(&data));
        assert!(!AccountFilter::employees_of(&company).matches(&data[..50]));
    }

    #[test]
    fn program_errors_keep_their_name() {
        let e: LedgerError = company_vesting::VestingError::NothingToClaim.into();
        assert_eq!(
            e,
            LedgerError::Program {
                name: "NothingToClaim".to_string(),
                message: "Nothing to claim".to_string(),
            }
        );
    }

    #[test]
    fn signature_displays_as_hex() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xab;
        bytes[31] = 0x01;
        let s = Signature(bytes).to_string();
        assert_eq!(s.len(), 64);
        assert!(s.starts_with("ab00"));
        assert!(s.ends_with("01"));
    }
}
