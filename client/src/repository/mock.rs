//! In-process sample portfolio. Instructions run through the vesting engine
//! as soon as they are submitted; there is no token movement.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anchor_lang::prelude::{msg, Pubkey};
use company_vesting::utils::{claim, pda, schedule};
use company_vesting::{EmployeeAccount, VestingAccount, VestingError};

use super::{recent_activity, Record, Submission, SubmissionState, VestingRepository};
use crate::error::{ClientError, Result};
use crate::ledger::{ActivityEntry, LedgerError, LedgerEvent, Signature, VestingInstruction};
use crate::memory_ledger::sign;

/// Reference clock of the sample portfolio, 2024-07-01T00:00:00Z.
pub const SAMPLE_NOW: i64 = 1_719_792_000;

const SAMPLE_MINT: Pubkey = Pubkey::new_from_array([0xee; 32]);

struct SampleCompany {
    name: &'static str,
    owner: [u8; 32],
}

struct SampleEmployee {
    company: usize,
    beneficiary: [u8; 32],
    start_time: i64,
    cliff_time: i64,
    end_time: i64,
    total_amount: u64,
}

const SAMPLE_COMPANIES: [SampleCompany; 3] = [
    SampleCompany { name: "TechCorp Solutions", owner: [0x11; 32] },
    SampleCompany { name: "InnovateLabs Inc", owner: [0x12; 32] },
    SampleCompany { name: "BlockChain Dynamics", owner: [0x13; 32] },
];

const SAMPLE_EMPLOYEES: [SampleEmployee; 4] = [
    // 2024-01-01 .. 2025-01-01, cliff 2024-04-01
    SampleEmployee {
        company: 0,
        beneficiary: [0x21; 32],
        start_time: 1_704_067_200,
        cliff_time: 1_711_929_600,
        end_time: 1_735_689_600,
        total_amount: 10_000,
    },
    // 2024-02-01 .. 2026-02-01, cliff 2024-08-01
    SampleEmployee {
        company: 0,
        beneficiary: [0x22; 32],
        start_time: 1_706_745_600,
        cliff_time: 1_722_470_400,
        end_time: 1_769_904_000,
        total_amount: 15_000,
    },
    // 2023-06-01 .. 2024-06-01, cliff 2023-09-01
    SampleEmployee {
        company: 1,
        beneficiary: [0x23; 32],
        start_time: 1_685_577_600,
        cliff_time: 1_693_526_400,
        end_time: 1_717_200_000,
        total_amount: 8_000,
    },
    // 2024-03-01 .. 2025-03-01, cliff 2024-06-01
    SampleEmployee {
        company: 2,
        beneficiary: [0x24; 32],
        start_time: 1_709_251_200,
        cliff_time: 1_717_200_000,
        end_time: 1_740_787_200,
        total_amount: 12_000,
    },
];

#[derive(Default)]
struct MockState {
    clock: i64,
    sequence: u64,
    companies: BTreeMap<Pubkey, VestingAccount>,
    employees: BTreeMap<Pubkey, EmployeeAccount>,
    outcomes: HashMap<Signature, SubmissionState>,
    activity: Vec<ActivityEntry>,
}

pub struct MockRepository {
    program_id: Pubkey,
    state: Mutex<MockState>,
}

impl MockRepository {
    pub fn new(program_id: Pubkey, now: i64) -> Self {
        Self {
            program_id,
            state: Mutex::new(MockState {
                clock: now,
                ..MockState::default()
            }),
        }
    }

    /// Three companies with four employees between them.
    pub fn sample(program_id: Pubkey, now: i64) -> Result<Self> {
        let repo = Self::new(program_id, now);
        {
            let mut state = repo.state();
            let mut companies = Vec::with_capacity(SAMPLE_COMPANIES.len());
            for c in &SAMPLE_COMPANIES {
                let ix = VestingInstruction::CreateVestingAccount {
                    signer: Pubkey::new_from_array(c.owner),
                    mint: SAMPLE_MINT,
                    company_name: c.name.to_string(),
                };
                apply(&program_id, &mut state, &ix)?;
                companies.push((pda::company_address(c.name, &program_id)?.0, c.owner));
            }
            for e in &SAMPLE_EMPLOYEES {
                let (company, owner) = companies[e.company];
                let ix = VestingInstruction::CreateEmployeeAccount {
                    owner: Pubkey::new_from_array(owner),
                    vesting_account: company,
                    beneficiary: Pubkey::new_from_array(e.beneficiary),
                    start_time: e.start_time,
                    end_time: e.end_time,
                    total_amount: e.total_amount,
                    cliff_time: e.cliff_time,
                };
                apply(&program_id, &mut state, &ix)?;
            }
        }
        Ok(repo)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_clock(&self, now: i64) {
        self.state().clock = now;
    }
}

impl VestingRepository for MockRepository {
    fn program_id(&self) -> Pubkey {
        self.program_id
    }

    fn now(&self) -> i64 {
        self.state().clock
    }

    fn vesting_account(&self, address: &Pubkey) -> Result<Option<Record<VestingAccount>>> {
        let state = self.state();
        Ok(state.companies.get(address).map(|account| Record {
            address: *address,
            account: account.clone(),
            fetched_at: state.clock,
        }))
    }

    fn vesting_accounts(&self, owner: Option<&Pubkey>) -> Result<Vec<Record<VestingAccount>>> {
        let state = self.state();
        Ok(state
            .companies
            .iter()
            .filter(|(_, account)| owner.map_or(true, |o| account.owner == *o))
            .map(|(address, account)| Record {
                address: *address,
                account: account.clone(),
                fetched_at: state.clock,
            })
            .collect())
    }

    fn employee_account(&self, address: &Pubkey) -> Result<Option<Record<EmployeeAccount>>> {
        let state = self.state();
        Ok(state.employees.get(address).map(|account| Record {
            address: *address,
            account: account.clone(),
            fetched_at: state.clock,
        }))
    }

    fn employee_accounts(&self, company: &Pubkey) -> Result<Vec<Option<Record<EmployeeAccount>>>> {
        let state = self.state();
        Ok(state
            .employees
            .iter()
            .filter(|(_, account)| account.vesting_account == *company)
            .map(|(address, account)| {
                Some(Record {
                    address: *address,
                    account: account.clone(),
                    fetched_at: state.clock,
                })
            })
            .collect())
    }

    // Mock data is always current.
    fn cached_employee_account(&self, address: &Pubkey) -> Result<Record<EmployeeAccount>> {
        self.employee_account(address)?
            .ok_or(ClientError::StaleRead(*address))
    }

    fn submit(&self, instruction: VestingInstruction) -> Result<Submission> {
        let mut state = self.state();
        state.sequence += 1;
        let signature = sign(state.sequence, &instruction)?;
        let outcome = match apply(&self.program_id, &mut state, &instruction) {
            Ok(events) => {
                let at = state.clock;
                state.activity.extend(events.iter().map(|event| ActivityEntry {
                    signature,
                    at,
                    event: event.clone(),
                }));
                SubmissionState::Confirmed { events }
            }
            Err(error) => {
                msg!("Mock transaction {} failed: {}", signature, error);
                SubmissionState::Failed(error)
            }
        };
        state.outcomes.insert(signature, outcome);
        Ok(Submission {
            signature,
            submitted_at: state.clock,
        })
    }

    fn status(&self, signature: &Signature) -> Result<SubmissionState> {
        self.state()
            .outcomes
            .get(signature)
            .cloned()
            .ok_or(ClientError::UnknownSubmission(*signature))
    }

    fn activity(&self, company: &Pubkey, limit: usize) -> Result<Vec<ActivityEntry>> {
        Ok(recent_activity(&self.state().activity, company, limit))
    }
}

fn apply(
    program_id: &Pubkey,
    state: &mut MockState,
    instruction: &VestingInstruction,
) -> std::result::Result<Vec<LedgerEvent>, LedgerError> {
    match instruction {
        VestingInstruction::CreateVestingAccount {
            signer,
            mint,
            company_name,
        } => {
            let (vesting_account, bump) = pda::company_address(company_name, program_id)?;
            let (treasury, treasury_bump) = pda::treasury_address(company_name, program_id)?;
            if state.companies.contains_key(&vesting_account) {
                return Err(LedgerError::AlreadyInUse(vesting_account));
            }
            state.companies.insert(
                vesting_account,
                VestingAccount {
                    owner: *signer,
                    mint: *mint,
                    treasury_token_account: treasury,
                    company_name: company_name.clone(),
                    treasury_bump,
                    bump,
                },
            );
            Ok(vec![LedgerEvent::VestingAccountCreated {
                vesting_account,
                owner: *signer,
                treasury_token_account: treasury,
                company_name: company_name.clone(),
            }])
        }

        VestingInstruction::CreateEmployeeAccount {
            owner,
            vesting_account,
            beneficiary,
            start_time,
            end_time,
            total_amount,
            cliff_time,
        } => {
            let company = state
                .companies
                .get(vesting_account)
                .ok_or(LedgerError::AccountNotFound(*vesting_account))?;
            if company.owner != *owner {
                return Err(VestingError::Unauthorized.into());
            }
            schedule::validate_schedule(*start_time, *cliff_time, *end_time)?;
            let (employee_account, bump) =
                pda::employee_address(beneficiary, vesting_account, program_id)?;
            if state.employees.contains_key(&employee_account) {
                return Err(LedgerError::AlreadyInUse(employee_account));
            }
            state.employees.insert(
                employee_account,
                EmployeeAccount {
                    beneficiary: *beneficiary,
                    vesting_account: *vesting_account,
                    start_time: *start_time,
                    cliff_time: *cliff_time,
                    end_time: *end_time,
                    total_amount: *total_amount,
                    total_withdrawn: 0,
                    bump,
                },
            );
            Ok(vec![LedgerEvent::EmployeeAccountCreated {
                employee_account,
                vesting_account: *vesting_account,
                beneficiary: *beneficiary,
            }])
        }

        VestingInstruction::ClaimTokens {
            beneficiary,
            employee_account,
            company_name,
        } => {
            let (vesting_account, _) = pda::company_address(company_name, program_id)?;
            if !state.companies.contains_key(&vesting_account) {
                return Err(LedgerError::AccountNotFound(vesting_account));
            }
            let employee = state
                .employees
                .get(employee_account)
                .ok_or(LedgerError::AccountNotFound(*employee_account))?;
            let (expected, _) = pda::employee_address(beneficiary, &vesting_account, program_id)?;
            if expected != *employee_account || employee.vesting_account != vesting_account {
                return Err(LedgerError::seeds_violation());
            }
            let (released, updated) = claim::claim(employee, state.clock, beneficiary)?;
            let total_withdrawn = updated.total_withdrawn;
            state.employees.insert(*employee_account, updated);
            Ok(vec![LedgerEvent::TokensClaimed {
                employee_account: *employee_account,
                vesting_account,
                beneficiary: *beneficiary,
                amount: released,
                total_withdrawn,
                time: state.clock,
            }])
        }
    }
}
