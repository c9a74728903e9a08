//! Account Repository: typed reads of vesting accounts and submission of
//! vesting instructions, behind one trait with interchangeable sources.

mod ledger;
mod mock;

pub use ledger::LedgerRepository;
pub use mock::{MockRepository, SAMPLE_NOW};

use anchor_lang::prelude::Pubkey;
use anchor_lang::AccountDeserialize;
use company_vesting::{EmployeeAccount, VestingAccount};

use crate::error::{ClientError, Result};
use crate::ledger::{
    AccountSnapshot, ActivityEntry, LedgerError, LedgerEvent, Signature, VestingInstruction,
};

/// A decoded account as of ledger time `fetched_at`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record<T> {
    pub address: Pubkey,
    pub account: T,
    pub fetched_at: i64,
}

/// Receipt for an instruction the source accepted for ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Submission {
    pub signature: Signature,
    pub submitted_at: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionState {
    /// Accepted, not final yet.
    Submitted,
    Confirmed { events: Vec<LedgerEvent> },
    Failed(LedgerError),
}

pub trait VestingRepository: Send + Sync {
    fn program_id(&self) -> Pubkey;

    /// Source clock, unix seconds.
    fn now(&self) -> i64;

    fn vesting_account(&self, address: &Pubkey) -> Result<Option<Record<VestingAccount>>>;

    /// All companies, or only those owned by `owner`.
    fn vesting_accounts(&self, owner: Option<&Pubkey>) -> Result<Vec<Record<VestingAccount>>>;

    fn employee_account(&self, address: &Pubkey) -> Result<Option<Record<EmployeeAccount>>>;

    /// One entry per employee account of `company`. `None` marks an account
    /// that exists but whose contents could not be read.
    fn employee_accounts(&self, company: &Pubkey) -> Result<Vec<Option<Record<EmployeeAccount>>>>;

    /// Last fetched snapshot without going to the source. `StaleRead` if
    /// there is none.
    fn cached_employee_account(&self, address: &Pubkey) -> Result<Record<EmployeeAccount>>;

    fn submit(&self, instruction: VestingInstruction) -> Result<Submission>;

    fn status(&self, signature: &Signature) -> Result<SubmissionState>;

    /// Up to `limit` confirmed events of `company`, newest first.
    fn activity(&self, company: &Pubkey, limit: usize) -> Result<Vec<ActivityEntry>>;
}

pub(crate) fn recent_activity(
    entries: &[ActivityEntry],
    company: &Pubkey,
    limit: usize,
) -> Vec<ActivityEntry> {
    entries
        .iter()
        .rev()
        .filter(|entry| entry.event.company() == *company)
        .take(limit)
        .cloned()
        .collect()
}

pub(crate) fn decode<T: AccountDeserialize>(snapshot: &AccountSnapshot) -> Result<Record<T>> {
    let account = T::try_deserialize(&mut snapshot.data.as_slice()).map_err(|e| {
        ClientError::Decode {
            address: snapshot.address,
            reason: e.to_string(),
        }
    })?;
    Ok(Record {
        address: snapshot.address,
        account,
        fetched_at: snapshot.fetched_at,
    })
}
