use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use anchor_lang::prelude::{msg, Pubkey};
use company_vesting::{EmployeeAccount, VestingAccount};

use super::{decode, recent_activity, Record, Submission, SubmissionState, VestingRepository};
use crate::error::{ClientError, Result};
use crate::ledger::{
    AccountFilter, AccountKind, AccountSnapshot, ActivityEntry, Ledger, Signature,
    TransactionStatus, VestingInstruction,
};

/// Repository reading from and submitting to a [`Ledger`].
pub struct LedgerRepository {
    ledger: Arc<dyn Ledger>,
    program_id: Pubkey,
    cache: Option<RwLock<HashMap<Pubkey, AccountSnapshot>>>,
}

impl LedgerRepository {
    pub fn new(ledger: Arc<dyn Ledger>, program_id: Pubkey, cache_snapshots: bool) -> Self {
        Self {
            ledger,
            program_id,
            cache: cache_snapshots.then(|| RwLock::new(HashMap::new())),
        }
    }

    fn remember(&self, snapshot: &AccountSnapshot) {
        if let Some(cache) = &self.cache {
            cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(snapshot.address, snapshot.clone());
        }
    }

    fn forget(&self, addresses: &[Pubkey]) {
        if let Some(cache) = &self.cache {
            let mut cache = cache.write().unwrap_or_else(PoisonError::into_inner);
            for address in addresses {
                cache.remove(address);
            }
        }
    }

    fn fetch<T: anchor_lang::AccountDeserialize>(
        &self,
        address: &Pubkey,
    ) -> Result<Option<Record<T>>> {
        match self.ledger.fetch_account(address)? {
            Some(snapshot) => {
                let record = decode(&snapshot)?;
                self.remember(&snapshot);
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

impl VestingRepository for LedgerRepository {
    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn now(&self) -> i64 {
        self.ledger.current_time()
    }

    fn vesting_account(&self, address: &Pubkey) -> Result<Option<Record<VestingAccount>>> {
        self.fetch(address)
    }

    fn vesting_accounts(&self, owner: Option<&Pubkey>) -> Result<Vec<Record<VestingAccount>>> {
        let filters: Vec<AccountFilter> = owner.map(AccountFilter::owned_by).into_iter().collect();
        let snapshots = self.ledger.list_accounts(AccountKind::VestingAccount, &filters)?;

        let mut out = Vec::with_capacity(snapshots.len());
        for snapshot in &snapshots {
            match decode(snapshot) {
                Ok(record) => {
                    self.remember(snapshot);
                    out.push(record);
                }
                Err(e) => msg!("Skipping vesting account: {}", e),
            }
        }
        Ok(out)
    }

    fn employee_account(&self, address: &Pubkey) -> Result<Option<Record<EmployeeAccount>>> {
        self.fetch(address)
    }

    fn employee_accounts(&self, company: &Pubkey) -> Result<Vec<Option<Record<EmployeeAccount>>>> {
        let snapshots = self.ledger.list_accounts(
            AccountKind::EmployeeAccount,
            &[AccountFilter::employees_of(company)],
        )?;

        Ok(snapshots
            .iter()
            .map(|snapshot| match decode(snapshot) {
                Ok(record) => {
                    self.remember(snapshot);
                    Some(record)
                }
                Err(e) => {
                    msg!("Employee account left out: {}", e);
                    None
                }
            })
            .collect())
    }

    fn cached_employee_account(&self, address: &Pubkey) -> Result<Record<EmployeeAccount>> {
        let snapshot = self
            .cache
            .as_ref()
            .and_then(|cache| {
                cache
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(address)
                    .cloned()
            })
            .ok_or(ClientError::StaleRead(*address))?;
        decode(&snapshot)
    }

    fn submit(&self, instruction: VestingInstruction) -> Result<Submission> {
        let submitted_at = self.ledger.current_time();
        let signature = self.ledger.submit(instruction)?;
        msg!("Submitted {}", signature);
        Ok(Submission {
            signature,
            submitted_at,
        })
    }

    fn status(&self, signature: &Signature) -> Result<SubmissionState> {
        match self.ledger.status(signature) {
            None => Err(ClientError::UnknownSubmission(*signature)),
            Some(TransactionStatus::Pending) => Ok(SubmissionState::Submitted),
            Some(TransactionStatus::Confirmed { events }) => {
                // Snapshots taken before this transaction no longer describe the account.
                for event in &events {
                    self.forget(&event.touched());
                }
                Ok(SubmissionState::Confirmed { events })
            }
            Some(TransactionStatus::Failed { error }) => Ok(SubmissionState::Failed(error)),
        }
    }

    fn activity(&self, company: &Pubkey, limit: usize) -> Result<Vec<ActivityEntry>> {
        Ok(recent_activity(&self.ledger.activity()?, company, limit))
    }
}
