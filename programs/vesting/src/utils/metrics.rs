//! Company-level roll-up of employee schedules.

use anchor_lang::prelude::Pubkey;

use crate::constants::MAX_TIMELINE_POINTS;
use crate::error::VestingError;
use crate::state::EmployeeAccount;
use crate::utils::schedule::{self, VestingStatus};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompanyMetrics {
    pub total_employees: u64,
    pub total_tokens_vested: u64,
    pub total_tokens_remaining: u64,
    pub active_schedules: u64,
    pub completed_schedules: u64,
    /// Always `total_tokens_vested + total_tokens_remaining`.
    pub total_value_locked: u64,
}

/// Portfolio totals at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelinePoint {
    pub at: i64,
    pub vested: u64,
    pub remaining: u64,
}

/// Fold every account of `company` into `CompanyMetrics` at `now`.
///
/// `None` entries stand for accounts that are known to exist but have not
/// been fetched; they are left out of every total rather than counted as
/// zero.
pub fn aggregate<'a, I>(
    company: &Pubkey,
    accounts: I,
    now: i64,
) -> Result<CompanyMetrics, VestingError>
where
    I: IntoIterator<Item = Option<&'a EmployeeAccount>>,
{
    let mut m = CompanyMetrics::default();

    for account in accounts.into_iter().flatten() {
        if account.vesting_account != *company {
            continue;
        }
        let vested = schedule::account_vested_amount(account, now)?;
        let remaining = account
            .total_amount
            .checked_sub(vested)
            .ok_or(VestingError::MathOverflow)?;

        m.total_employees = m
            .total_employees
            .checked_add(1)
            .ok_or(VestingError::MathOverflow)?;
        m.total_tokens_vested = m
            .total_tokens_vested
            .checked_add(vested)
            .ok_or(VestingError::MathOverflow)?;
        m.total_tokens_remaining = m
            .total_tokens_remaining
            .checked_add(remaining)
            .ok_or(VestingError::MathOverflow)?;

        match schedule::vesting_status(account.cliff_time, account.end_time, now) {
            VestingStatus::Active => m.active_schedules += 1,
            VestingStatus::Completed => m.completed_schedules += 1,
            VestingStatus::Pending | VestingStatus::Paused => {}
        }
    }

    m.total_value_locked = m
        .total_tokens_vested
        .checked_add(m.total_tokens_remaining)
        .ok_or(VestingError::MathOverflow)?;
    Ok(m)
}

/// Project company totals at `points` instants starting at `from`, `step` seconds apart.
pub fn timeline<'a, I>(
    company: &Pubkey,
    accounts: I,
    from: i64,
    step: i64,
    points: usize,
) -> Result<Vec<TimelinePoint>, VestingError>
where
    I: IntoIterator<Item = Option<&'a EmployeeAccount>>,
{
    if step <= 0 || points == 0 || points > MAX_TIMELINE_POINTS {
        return Err(VestingError::InvalidSchedule);
    }
    let instant = |i: usize| {
        i64::try_from(i)
            .ok()
            .and_then(|i| step.checked_mul(i))
            .and_then(|offset| from.checked_add(offset))
            .ok_or(VestingError::MathOverflow)
    };
    // The last instant bounds every earlier one.
    instant(points - 1)?;
    let accounts: Vec<Option<&EmployeeAccount>> = accounts.into_iter().collect();

    let mut out = Vec::with_capacity(points);
    for i in 0..points {
        let at = instant(i)?;
        let m = aggregate(company, accounts.iter().copied(), at)?;
        out.push(TimelinePoint {
            at,
            vested: m.total_tokens_vested,
            remaining: m.total_tokens_remaining,
        });
    }
    Ok(out)
}
