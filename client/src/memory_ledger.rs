//! Single-process ledger. Instructions are queued on submit and executed in
//! order by `process_pending`, each one under the state lock, so every
//! instruction either applies completely or not at all.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anchor_lang::prelude::{msg, AccountDeserialize, AccountSerialize, AnchorSerialize, Pubkey};
use company_vesting::utils::{claim, pda, schedule};
use company_vesting::{EmployeeAccount, VestingAccount, VestingError};

use crate::ledger::{
    AccountFilter, AccountKind, AccountSnapshot, ActivityEntry, Ledger, LedgerError, LedgerEvent,
    Signature, TransactionStatus, VestingInstruction,
};

/// Token balance held at a token account address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenAccount {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

#[derive(Default)]
struct LedgerState {
    clock: i64,
    sequence: u64,
    accounts: BTreeMap<Pubkey, Vec<u8>>,
    token_accounts: BTreeMap<Pubkey, TokenAccount>,
    queue: VecDeque<(Signature, VestingInstruction)>,
    statuses: HashMap<Signature, TransactionStatus>,
    activity: Vec<ActivityEntry>,
}

pub struct InMemoryLedger {
    program_id: Pubkey,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(program_id: Pubkey, clock: i64) -> Self {
        Self {
            program_id,
            state: Mutex::new(LedgerState {
                clock,
                ..LedgerState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn set_clock(&self, now: i64) {
        self.state().clock = now;
    }

    pub fn advance_clock(&self, seconds: i64) {
        let mut state = self.state();
        state.clock = state.clock.saturating_add(seconds);
    }

    /// Credit an existing token account, e.g. to fund a company treasury.
    pub fn mint_to(&self, token_account: &Pubkey, amount: u64) -> Result<(), LedgerError> {
        let mut state = self.state();
        let account = state
            .token_accounts
            .get_mut(token_account)
            .ok_or(LedgerError::AccountNotFound(*token_account))?;
        account.amount = account
            .amount
            .checked_add(amount)
            .ok_or(VestingError::MathOverflow)?;
        Ok(())
    }

    pub fn token_account(&self, address: &Pubkey) -> Option<TokenAccount> {
        self.state().token_accounts.get(address).copied()
    }

    /// Instructions accepted but not executed yet.
    pub fn pending(&self) -> usize {
        self.state().queue.len()
    }

    /// Execute every queued instruction in submission order. Returns how many ran.
    pub fn process_pending(&self) -> usize {
        let mut state = self.state();
        let mut processed = 0;
        while let Some((signature, instruction)) = state.queue.pop_front() {
            let status = match execute(&self.program_id, &mut state, &instruction) {
                Ok(events) => {
                    let at = state.clock;
                    state.activity.extend(events.iter().map(|event| ActivityEntry {
                        signature,
                        at,
                        event: event.clone(),
                    }));
                    TransactionStatus::Confirmed { events }
                }
                Err(error) => {
                    msg!("Transaction {} failed: {}", signature, error);
                    TransactionStatus::Failed { error }
                }
            };
            state.statuses.insert(signature, status);
            processed += 1;
        }
        processed
    }
}

impl Ledger for InMemoryLedger {
    fn submit(&self, instruction: VestingInstruction) -> Result<Signature, LedgerError> {
        let mut state = self.state();
        state.sequence += 1;
        let signature = sign(state.sequence, &instruction)?;
        state.statuses.insert(signature, TransactionStatus::Pending);
        state.queue.push_back((signature, instruction));
        Ok(signature)
    }

    fn status(&self, signature: &Signature) -> Option<TransactionStatus> {
        self.state().statuses.get(signature).cloned()
    }

    fn fetch_account(&self, address: &Pubkey) -> Result<Option<AccountSnapshot>, LedgerError> {
        let state = self.state();
        Ok(state.accounts.get(address).map(|data| AccountSnapshot {
            address: *address,
            data: data.clone(),
            fetched_at: state.clock,
        }))
    }

    fn list_accounts(
        &self,
        kind: AccountKind,
        filters: &[AccountFilter],
    ) -> Result<Vec<AccountSnapshot>, LedgerError> {
        let state = self.state();
        Ok(state
            .accounts
            .iter()
            .filter(|(_, data)| kind.matches(data) && filters.iter().all(|f| f.matches(data)))
            .map(|(address, data)| AccountSnapshot {
                address: *address,
                data: data.clone(),
                fetched_at: state.clock,
            })
            .collect())
    }

    fn current_time(&self) -> i64 {
        self.state().clock
    }

    fn activity(&self) -> Result<Vec<ActivityEntry>, LedgerError> {
        Ok(self.state().activity.clone())
    }
}

pub(crate) fn sign(
    sequence: u64,
    instruction: &VestingInstruction,
) -> Result<Signature, LedgerError> {
    let mut data = Vec::new();
    instruction
        .serialize(&mut data)
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(&sequence.to_le_bytes());
    hasher.update(&data);
    Ok(Signature(*hasher.finalize().as_bytes()))
}

fn encode<T: AccountSerialize>(account: &T) -> Result<Vec<u8>, LedgerError> {
    let mut data = Vec::new();
    account
        .try_serialize(&mut data)
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
    Ok(data)
}

fn decode<T: AccountDeserialize>(state: &LedgerState, address: &Pubkey) -> Result<T, LedgerError> {
    let data = state
        .accounts
        .get(address)
        .ok_or(LedgerError::AccountNotFound(*address))?;
    T::try_deserialize(&mut data.as_slice()).map_err(|e| LedgerError::Program {
        name: "AccountDidNotDeserialize".to_string(),
        message: e.to_string(),
    })
}

/// Checks run first; state is written only once every check has passed.
fn execute(
    program_id: &Pubkey,
    state: &mut LedgerState,
    instruction: &VestingInstruction,
) -> Result<Vec<LedgerEvent>, LedgerError> {
    match instruction {
        VestingInstruction::CreateVestingAccount {
            signer,
            mint,
            company_name,
        } => {
            let (vesting_account, bump) = pda::company_address(company_name, program_id)?;
            let (treasury, treasury_bump) = pda::treasury_address(company_name, program_id)?;
            if state.accounts.contains_key(&vesting_account) {
                return Err(LedgerError::AlreadyInUse(vesting_account));
            }
            if state.token_accounts.contains_key(&treasury) {
                return Err(LedgerError::AlreadyInUse(treasury));
            }

            let data = encode(&VestingAccount {
                owner: *signer,
                mint: *mint,
                treasury_token_account: treasury,
                company_name: company_name.clone(),
                treasury_bump,
                bump,
            })?;
            state.accounts.insert(vesting_account, data);
            state.token_accounts.insert(
                treasury,
                TokenAccount {
                    mint: *mint,
                    owner: treasury,
                    amount: 0,
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
            let company: VestingAccount = decode(state, vesting_account)?;
            if company.owner != *owner {
                return Err(VestingError::Unauthorized.into());
            }
            schedule::validate_schedule(*start_time, *cliff_time, *end_time)?;
            let (employee_account, bump) =
                pda::employee_address(beneficiary, vesting_account, program_id)?;
            if state.accounts.contains_key(&employee_account) {
                return Err(LedgerError::AlreadyInUse(employee_account));
            }

            let data = encode(&EmployeeAccount {
                beneficiary: *beneficiary,
                vesting_account: *vesting_account,
                start_time: *start_time,
                cliff_time: *cliff_time,
                end_time: *end_time,
                total_amount: *total_amount,
                total_withdrawn: 0,
                bump,
            })?;
            state.accounts.insert(employee_account, data);

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
            let company: VestingAccount = decode(state, &vesting_account)?;
            let employee: EmployeeAccount = decode(state, employee_account)?;

            let (expected, _) = pda::employee_address(beneficiary, &vesting_account, program_id)?;
            if expected != *employee_account || employee.vesting_account != vesting_account {
                return Err(LedgerError::seeds_violation());
            }

            let (released, updated) = claim::claim(&employee, state.clock, beneficiary)?;

            let treasury = state
                .token_accounts
                .get(&company.treasury_token_account)
                .copied()
                .ok_or(LedgerError::AccountNotFound(company.treasury_token_account))?;
            if treasury.amount < released {
                return Err(VestingError::InsufficientTreasury.into());
            }
            let destination = pda::associated_token_address(beneficiary, &company.mint);
            let mut credited = state
                .token_accounts
                .get(&destination)
                .copied()
                .unwrap_or(TokenAccount {
                    mint: company.mint,
                    owner: *beneficiary,
                    amount: 0,
                });
            credited.amount = credited
                .amount
                .checked_add(released)
                .ok_or(VestingError::MathOverflow)?;
            let data = encode(&updated)?;

            state.token_accounts.insert(
                company.treasury_token_account,
                TokenAccount {
                    amount: treasury.amount - released,
                    ..treasury
                },
            );
            state.token_accounts.insert(destination, credited);
            state.accounts.insert(*employee_account, data);

            Ok(vec![LedgerEvent::TokensClaimed {
                employee_account: *employee_account,
                vesting_account,
                beneficiary: *beneficiary,
                amount: released,
                total_withdrawn: updated.total_withdrawn,
                time: state.clock,
            }])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPANY: &str = "Gradify";

    struct Fixture {
        ledger: InMemoryLedger,
        employer: Pubkey,
        beneficiary: Pubkey,
        mint: Pubkey,
        company: Pubkey,
        treasury: Pubkey,
        employee: Pubkey,
    }

    fn confirmed(ledger: &InMemoryLedger, ix: VestingInstruction) -> Vec<LedgerEvent> {
        let sig = ledger.submit(ix).unwrap();
        ledger.process_pending();
        match ledger.status(&sig).unwrap() {
            TransactionStatus::Confirmed { events } => events,
            other => panic!("expected confirmation, got {other:?}"),
        }
    }

    fn failed(ledger: &InMemoryLedger, ix: VestingInstruction) -> LedgerError {
        let sig = ledger.submit(ix).unwrap();
        ledger.process_pending();
        match ledger.status(&sig).unwrap() {
            TransactionStatus::Failed { error } => error,
            other => panic!("expected failure, got {other:?}"),
        }
    }

    fn claim_ix(f: &Fixture) -> VestingInstruction {
        VestingInstruction::ClaimTokens {
            beneficiary: f.beneficiary,
            employee_account: f.employee,
            company_name: COMPANY.to_string(),
        }
    }

    fn setup(funding: u64) -> Fixture {
        let program_id = company_vesting::ID;
        let ledger = InMemoryLedger::new(program_id, 0);
        let employer = Pubkey::new_unique();
        let beneficiary = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let (company, _) = pda::company_address(COMPANY, &program_id).unwrap();
        let (treasury, _) = pda::treasury_address(COMPANY, &program_id).unwrap();
        let (employee, _) = pda::employee_address(&beneficiary, &company, &program_id).unwrap();

        confirmed(
            &ledger,
            VestingInstruction::CreateVestingAccount {
                signer: employer,
                mint,
                company_name: COMPANY.to_string(),
            },
        );
        ledger.mint_to(&treasury, funding).unwrap();
        confirmed(
            &ledger,
            VestingInstruction::CreateEmployeeAccount {
                owner: employer,
                vesting_account: company,
                beneficiary,
                start_time: 0,
                end_time: 200,
                total_amount: 1000,
                cliff_time: 100,
            },
        );

        Fixture {
            ledger,
            employer,
            beneficiary,
            mint,
            company,
            treasury,
            employee,
        }
    }

    fn stored_employee(f: &Fixture) -> EmployeeAccount {
        decode(&f.ledger.state(), &f.employee).unwrap()
    }

    #[test]
    fn submission_is_pending_until_processed() {
        let ledger = InMemoryLedger::new(company_vesting::ID, 0);
        let sig = ledger
            .submit(VestingInstruction::CreateVestingAccount {
                signer: Pubkey::new_unique(),
                mint: Pubkey::new_unique(),
                company_name: "Acme".to_string(),
            })
            .unwrap();
        assert_eq!(ledger.status(&sig), Some(TransactionStatus::Pending));
        assert_eq!(ledger.pending(), 1);
        assert_eq!(ledger.process_pending(), 1);
        assert!(matches!(
            ledger.status(&sig),
            Some(TransactionStatus::Confirmed { .. })
        ));
        assert_eq!(ledger.status(&Signature([9; 32])), None);
    }

    #[test]
    fn creates_company_treasury_and_employee() {
        let f = setup(10_000);
        let company: VestingAccount = decode(&f.ledger.state(), &f.company).unwrap();
        assert_eq!(company.owner, f.employer);
        assert_eq!(company.mint, f.mint);
        assert_eq!(company.treasury_token_account, f.treasury);
        assert_eq!(f.ledger.token_account(&f.treasury).unwrap().amount, 10_000);

        let employee = stored_employee(&f);
        assert_eq!(employee.beneficiary, f.beneficiary);
        assert_eq!(employee.vesting_account, f.company);
        assert_eq!(employee.total_withdrawn, 0);
    }

    #[test]
    fn claim_moves_tokens_and_records_withdrawal() {
        let f = setup(10_000);
        f.ledger.set_clock(150);
        let events = confirmed(&f.ledger, claim_ix(&f));
        assert!(matches!(
            events.as_slice(),
            [LedgerEvent::TokensClaimed { amount: 750, total_withdrawn: 750, .. }]
        ));

        let ata = pda::associated_token_address(&f.beneficiary, &f.mint);
        assert_eq!(f.ledger.token_account(&ata).unwrap().amount, 750);
        assert_eq!(f.ledger.token_account(&f.treasury).unwrap().amount, 9_250);
        assert_eq!(stored_employee(&f).total_withdrawn, 750);
    }

    #[test]
    fn back_to_back_claims_release_once() {
        let f = setup(10_000);
        f.ledger.set_clock(150);
        let first = f.ledger.submit(claim_ix(&f)).unwrap();
        let second = f.ledger.submit(claim_ix(&f)).unwrap();
        assert_ne!(first, second);
        f.ledger.process_pending();

        assert!(matches!(
            f.ledger.status(&first),
            Some(TransactionStatus::Confirmed { .. })
        ));
        assert_eq!(
            f.ledger.status(&second),
            Some(TransactionStatus::Failed {
                error: VestingError::NothingToClaim.into()
            })
        );
        assert_eq!(stored_employee(&f).total_withdrawn, 750);
    }

    #[test]
    fn failed_claim_changes_nothing() {
        let f = setup(100);
        f.ledger.set_clock(150);
        let err = failed(&f.ledger, claim_ix(&f));
        assert_eq!(err, VestingError::InsufficientTreasury.into());

        assert_eq!(f.ledger.token_account(&f.treasury).unwrap().amount, 100);
        let ata = pda::associated_token_address(&f.beneficiary, &f.mint);
        assert_eq!(f.ledger.token_account(&ata), None);
        assert_eq!(stored_employee(&f).total_withdrawn, 0);
    }

    #[test]
    fn only_owner_creates_employees() {
        let f = setup(0);
        let err = failed(
            &f.ledger,
            VestingInstruction::CreateEmployeeAccount {
                owner: Pubkey::new_unique(),
                vesting_account: f.company,
                beneficiary: Pubkey::new_unique(),
                start_time: 0,
                end_time: 10,
                total_amount: 1,
                cliff_time: 0,
            },
        );
        assert_eq!(err, VestingError::Unauthorized.into());
    }

    #[test]
    fn rejects_duplicates_and_bad_schedules() {
        let f = setup(0);
        let err = failed(
            &f.ledger,
            VestingInstruction::CreateVestingAccount {
                signer: Pubkey::new_unique(),
                mint: f.mint,
                company_name: COMPANY.to_string(),
            },
        );
        assert_eq!(err, LedgerError::AlreadyInUse(f.company));

        let err = failed(
            &f.ledger,
            VestingInstruction::CreateEmployeeAccount {
                owner: f.employer,
                vesting_account: f.company,
                beneficiary: Pubkey::new_unique(),
                start_time: 100,
                end_time: 50,
                total_amount: 1,
                cliff_time: 100,
            },
        );
        assert_eq!(err, VestingError::InvalidSchedule.into());
    }

    #[test]
    fn claim_by_someone_else_is_rejected() {
        let f = setup(10_000);
        f.ledger.set_clock(150);
        let err = failed(
            &f.ledger,
            VestingInstruction::ClaimTokens {
                beneficiary: Pubkey::new_unique(),
                employee_account: f.employee,
                company_name: COMPANY.to_string(),
            },
        );
        assert_eq!(
            err,
            LedgerError::Program {
                name: "ConstraintSeeds".to_string(),
                message: "A seeds constraint was violated".to_string(),
            }
        );
    }

    #[test]
    fn lists_accounts_by_kind_and_filter() {
        let f = setup(0);
        let companies = f
            .ledger
            .list_accounts(
                AccountKind::VestingAccount,
                &[AccountFilter::owned_by(&f.employer)],
            )
            .unwrap();
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].address, f.company);

        let employees = f
            .ledger
            .list_accounts(
                AccountKind::EmployeeAccount,
                &[AccountFilter::employees_of(&f.company)],
            )
            .unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].address, f.employee);

        let none = f
            .ledger
            .list_accounts(
                AccountKind::EmployeeAccount,
                &[AccountFilter::employees_of(&Pubkey::new_unique())],
            )
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn signatures_are_deterministic_per_history() {
        let ix = VestingInstruction::CreateVestingAccount {
            signer: Pubkey::new_from_array([1; 32]),
            mint: Pubkey::new_from_array([2; 32]),
            company_name: "Acme".to_string(),
        };
        let a = InMemoryLedger::new(company_vesting::ID, 0);
        let b = InMemoryLedger::new(company_vesting::ID, 0);
        let first = a.submit(ix.clone()).unwrap();
        assert_eq!(first, b.submit(ix.clone()).unwrap());
        assert_eq!(first, sign(1, &ix).unwrap());
        assert_ne!(a.submit(ix).unwrap(), first);
    }
}
