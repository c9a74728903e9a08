use std::sync::Arc;

use anchor_lang::prelude::{msg, Pubkey};
use company_vesting::utils::metrics::{self, CompanyMetrics, TimelinePoint};
use company_vesting::utils::schedule::{self, VestingProgress};
use company_vesting::utils::{claim, pda};
use company_vesting::{EmployeeAccount, VestingAccount, VestingError};

use crate::config::{ClientConfig, DataSource};
use crate::error::{ClientError, Result};
use crate::ledger::{
    ActivityEntry, Ledger, LedgerError, LedgerEvent, Signature, VestingInstruction,
};
use crate::repository::{
    LedgerRepository, MockRepository, Record, SubmissionState, VestingRepository, SAMPLE_NOW,
};

/// An accepted submission. `expected` is what the client predicted locally;
/// the confirmed value comes from the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pending<T> {
    pub signature: Signature,
    pub submitted_at: i64,
    pub expected: T,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Finality<T> {
    Submitted,
    Confirmed(T),
    Failed(LedgerError),
}

/// One row of a company's employee table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmployeeSummary {
    pub address: Pubkey,
    pub account: EmployeeAccount,
    pub progress: VestingProgress,
    pub fetched_at: i64,
}

pub struct VestingClient {
    repository: Box<dyn VestingRepository>,
}

impl VestingClient {
    pub fn new(repository: Box<dyn VestingRepository>) -> Self {
        Self { repository }
    }

    /// Build the repository named by `config.data_source`.
    pub fn open(config: &ClientConfig, ledger: Option<Arc<dyn Ledger>>) -> Result<Self> {
        let repository: Box<dyn VestingRepository> = match config.data_source {
            DataSource::Ledger => {
                let ledger = ledger.ok_or_else(|| {
                    ClientError::Config("ledger data source selected without a ledger".to_string())
                })?;
                Box::new(LedgerRepository::new(
                    ledger,
                    company_vesting::ID,
                    config.cache_snapshots,
                ))
            }
            DataSource::Mock => Box::new(MockRepository::sample(
                company_vesting::ID,
                config.mock_clock.unwrap_or(SAMPLE_NOW),
            )?),
        };
        Ok(Self::new(repository))
    }

    pub fn repository(&self) -> &dyn VestingRepository {
        self.repository.as_ref()
    }

    fn submit<T>(&self, instruction: VestingInstruction, expected: T) -> Result<Pending<T>> {
        let submission = self.repository.submit(instruction)?;
        Ok(Pending {
            signature: submission.signature,
            submitted_at: submission.submitted_at,
            expected,
        })
    }

    pub fn create_vesting_account(
        &self,
        owner: &Pubkey,
        company_name: &str,
        mint: &Pubkey,
    ) -> Result<Pending<Pubkey>> {
        let (address, _) = pda::company_address(company_name, &self.repository.program_id())?;
        msg!("Creating vesting account {} for {}", address, company_name);
        self.submit(
            VestingInstruction::CreateVestingAccount {
                signer: *owner,
                mint: *mint,
                company_name: company_name.to_string(),
            },
            address,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_employee_account(
        &self,
        company: &Pubkey,
        owner: &Pubkey,
        beneficiary: &Pubkey,
        start_time: i64,
        cliff_time: i64,
        end_time: i64,
        total_amount: u64,
    ) -> Result<Pending<Pubkey>> {
        schedule::validate_schedule(start_time, cliff_time, end_time)?;
        let record = self.company(company)?;
        if record.account.owner != *owner {
            return Err(VestingError::Unauthorized.into());
        }
        let (address, _) =
            pda::employee_address(beneficiary, company, &self.repository.program_id())?;

        self.submit(
            VestingInstruction::CreateEmployeeAccount {
                owner: *owner,
                vesting_account: *company,
                beneficiary: *beneficiary,
                start_time,
                end_time,
                total_amount,
                cliff_time,
            },
            address,
        )
    }

    /// Checks authorization and claimability against a fresh read before
    /// submitting. `expected` is the amount claimable at submission time.
    pub fn claim_tokens(&self, employee: &Pubkey, requester: &Pubkey) -> Result<Pending<u64>> {
        let record = self
            .repository
            .employee_account(employee)?
            .ok_or(ClientError::NotFound(*employee))?;
        let company = self.company(&record.account.vesting_account)?;
        let (expected, _) = claim::claim(&record.account, self.repository.now(), requester)?;

        self.submit(
            VestingInstruction::ClaimTokens {
                beneficiary: *requester,
                employee_account: *employee,
                company_name: company.account.company_name,
            },
            expected,
        )
    }

    fn finality(&self, signature: &Signature) -> Result<Finality<Vec<LedgerEvent>>> {
        Ok(match self.repository.status(signature)? {
            SubmissionState::Submitted => Finality::Submitted,
            SubmissionState::Confirmed { events } => Finality::Confirmed(events),
            SubmissionState::Failed(error) => Finality::Failed(error),
        })
    }

    pub fn confirm_address(&self, pending: &Pending<Pubkey>) -> Result<Finality<Pubkey>> {
        Ok(match self.finality(&pending.signature)? {
            Finality::Submitted => Finality::Submitted,
            Finality::Confirmed(_) => Finality::Confirmed(pending.expected),
            Finality::Failed(e) => Finality::Failed(e),
        })
    }

    /// The released amount is the one the ledger reported, which can exceed
    /// `expected` if more vested between submission and execution.
    pub fn confirm_claim(&self, pending: &Pending<u64>) -> Result<Finality<u64>> {
        Ok(match self.finality(&pending.signature)? {
            Finality::Submitted => Finality::Submitted,
            Finality::Confirmed(events) => Finality::Confirmed(
                events
                    .iter()
                    .find_map(|event| match event {
                        LedgerEvent::TokensClaimed { amount, .. } => Some(*amount),
                        _ => None,
                    })
                    .unwrap_or(pending.expected),
            ),
            Finality::Failed(e) => Finality::Failed(e),
        })
    }

    pub fn company(&self, address: &Pubkey) -> Result<Record<VestingAccount>> {
        self.repository
            .vesting_account(address)?
            .ok_or(ClientError::NotFound(*address))
    }

    pub fn list_companies(&self, owner: Option<&Pubkey>) -> Result<Vec<Record<VestingAccount>>> {
        self.repository.vesting_accounts(owner)
    }

    pub fn get_company_metrics(&self, company: &Pubkey) -> Result<CompanyMetrics> {
        let rows = self.repository.employee_accounts(company)?;
        let now = self.repository.now();
        Ok(metrics::aggregate(
            company,
            rows.iter().map(|row| row.as_ref().map(|r| &r.account)),
            now,
        )?)
    }

    /// Employees of `company` with their progress at the source clock.
    /// Unreadable accounts are left out.
    pub fn list_employees(&self, company: &Pubkey) -> Result<Vec<EmployeeSummary>> {
        let now = self.repository.now();
        self.repository
            .employee_accounts(company)?
            .into_iter()
            .flatten()
            .map(|record| -> Result<EmployeeSummary> {
                Ok(EmployeeSummary {
                    progress: schedule::progress(&record.account, now)?,
                    address: record.address,
                    account: record.account,
                    fetched_at: record.fetched_at,
                })
            })
            .collect()
    }

    /// Latest confirmed creations and claims of `company`, newest first.
    pub fn recent_activity(&self, company: &Pubkey, limit: usize) -> Result<Vec<ActivityEntry>> {
        self.repository.activity(company, limit)
    }

    /// Portfolio vested/remaining at `points` instants from now, `step` seconds apart.
    pub fn vesting_timeline(
        &self,
        company: &Pubkey,
        step: i64,
        points: usize,
    ) -> Result<Vec<TimelinePoint>> {
        let rows = self.repository.employee_accounts(company)?;
        Ok(metrics::timeline(
            company,
            rows.iter().map(|row| row.as_ref().map(|r| &r.account)),
            self.repository.now(),
            step,
            points,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use company_vesting::utils::schedule::VestingStatus;

    fn mock() -> VestingClient {
        let config = ClientConfig {
            data_source: DataSource::Mock,
            ..ClientConfig::default()
        };
        VestingClient::open(&config, None).unwrap()
    }

    fn company(name: &str) -> Pubkey {
        pda::company_address(name, &company_vesting::ID).unwrap().0
    }

    #[test]
    fn ledger_source_requires_a_ledger() {
        assert!(matches!(
            VestingClient::open(&ClientConfig::default(), None),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn sample_metrics() {
        let client = mock();
        let m = client.get_company_metrics(&company("TechCorp Solutions")).unwrap();
        assert_eq!(m.total_employees, 2);
        assert_eq!(m.total_tokens_vested, 4972);
        assert_eq!(m.total_tokens_remaining, 25_000 - 4972);
        assert_eq!(m.total_value_locked, 25_000);
        assert_eq!(m.active_schedules, 1);
        assert_eq!(m.completed_schedules, 0);

        let m = client.get_company_metrics(&company("InnovateLabs Inc")).unwrap();
        assert_eq!(m.completed_schedules, 1);
        assert_eq!(m.total_tokens_vested, 8000);
        assert_eq!(m.total_tokens_remaining, 0);

        let unknown = client.get_company_metrics(&Pubkey::new_unique()).unwrap();
        assert_eq!(unknown, CompanyMetrics::default());
    }

    #[test]
    fn employee_rows_carry_progress() {
        let client = mock();
        let rows = client.list_employees(&company("TechCorp Solutions")).unwrap();
        assert_eq!(rows.len(), 2);

        let statuses: Vec<VestingStatus> = rows.iter().map(|r| r.progress.status).collect();
        assert!(statuses.contains(&VestingStatus::Active));
        assert!(statuses.contains(&VestingStatus::Pending));
        for row in &rows {
            assert_eq!(row.progress.vested + row.progress.remaining, row.account.total_amount);
            assert_eq!(row.fetched_at, SAMPLE_NOW);
        }
    }

    #[test]
    fn local_checks_run_before_submission() {
        let client = mock();
        let techcorp = company("TechCorp Solutions");
        let owner = Pubkey::new_from_array([0x11; 32]);

        assert!(matches!(
            client.create_vesting_account(&owner, "", &Pubkey::new_unique()),
            Err(ClientError::Vesting(VestingError::InvalidSeed))
        ));
        assert!(matches!(
            client.create_employee_account(
                &techcorp,
                &owner,
                &Pubkey::new_unique(),
                10,
                5,
                20,
                1
            ),
            Err(ClientError::Vesting(VestingError::InvalidSchedule))
        ));
        assert!(matches!(
            client.create_employee_account(
                &techcorp,
                &Pubkey::new_unique(),
                &Pubkey::new_unique(),
                0,
                0,
                10,
                1
            ),
            Err(ClientError::Vesting(VestingError::Unauthorized))
        ));
        assert!(matches!(
            client.create_employee_account(&Pubkey::new_unique(), &owner, &owner, 0, 0, 10, 1),
            Err(ClientError::NotFound(_))
        ));

        let bob = Pubkey::new_from_array([0x22; 32]);
        let (bob_account, _) =
            pda::employee_address(&bob, &techcorp, &company_vesting::ID).unwrap();
        assert!(matches!(
            client.claim_tokens(&bob_account, &bob),
            Err(ClientError::Vesting(VestingError::NothingToClaim))
        ));
        assert!(matches!(
            client.claim_tokens(&bob_account, &owner),
            Err(ClientError::Vesting(VestingError::Unauthorized))
        ));
    }

    #[test]
    fn claim_confirms_with_released_amount() {
        let client = mock();
        let techcorp = company("TechCorp Solutions");
        let alice = Pubkey::new_from_array([0x21; 32]);
        let (account, _) = pda::employee_address(&alice, &techcorp, &company_vesting::ID).unwrap();

        let pending = client.claim_tokens(&account, &alice).unwrap();
        assert_eq!(pending.expected, 4972);
        assert_eq!(client.confirm_claim(&pending).unwrap(), Finality::Confirmed(4972));

        let row = client
            .list_employees(&techcorp)
            .unwrap()
            .into_iter()
            .find(|r| r.address == account)
            .unwrap();
        assert_eq!(row.progress.withdrawn, 4972);
        assert_eq!(row.progress.claimable, 0);

        let feed = client.recent_activity(&techcorp, 10).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].signature, pending.signature);
        assert_eq!(feed[0].at, SAMPLE_NOW);
        assert!(matches!(feed[0].event, LedgerEvent::TokensClaimed { amount: 4972, .. }));
        assert!(client.recent_activity(&company("InnovateLabs Inc"), 10).unwrap().is_empty());
    }

    #[test]
    fn timeline_starts_at_source_clock() {
        let client = mock();
        let points = client
            .vesting_timeline(&company("BlockChain Dynamics"), 86_400 * 30, 12)
            .unwrap();
        assert_eq!(points.len(), 12);
        assert_eq!(points[0].at, SAMPLE_NOW);
        assert!(points.windows(2).all(|w| w[0].vested <= w[1].vested));
        assert_eq!(points[11].vested, 12_000);
    }
}
