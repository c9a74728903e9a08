use anchor_lang::prelude::Pubkey;

use crate::error::VestingError;
use crate::state::EmployeeAccount;
use crate::utils::schedule;

/// Amount the beneficiary could withdraw at `now`, without authorization checks.
pub fn claimable_amount(account: &EmployeeAccount, now: i64) -> Result<u64, VestingError> {
    let vested = schedule::account_vested_amount(account, now)?;
    Ok(vested.saturating_sub(account.total_withdrawn))
}

/// Authorize a withdrawal by `requester` at `now`.
///
/// Returns the released amount and the account as it must be stored once the
/// matching transfer succeeds. The input is never modified, so a failed claim
/// leaves no trace.
pub fn claim(
    account: &EmployeeAccount,
    now: i64,
    requester: &Pubkey,
) -> Result<(u64, EmployeeAccount), VestingError> {
    if *requester != account.beneficiary {
        return Err(VestingError::Unauthorized);
    }

    let vested = schedule::account_vested_amount(account, now)?;
    let claimable = (vested as i128) - (account.total_withdrawn as i128);
    if claimable <= 0 {
        return Err(VestingError::NothingToClaim);
    }
    let claimable = u64::try_from(claimable).map_err(|_| VestingError::MathOverflow)?;

    let mut updated = account.clone();
    updated.total_withdrawn = updated
        .total_withdrawn
        .checked_add(claimable)
        .ok_or(VestingError::MathOverflow)?;
    Ok((claimable, updated))
}
