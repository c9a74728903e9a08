//! Linear vesting with a cliff.
//! - vested = 0 while now <= cliff (the cliff instant itself is still locked)
//! - vested = total once now >= end
//! - otherwise floor(total * (now - start) / (end - start))

use anchor_lang::prelude::{borsh, AnchorDeserialize, AnchorSerialize};

use crate::error::VestingError;
use crate::state::EmployeeAccount;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VestingStatus {
    /// Cliff not passed yet.
    Pending,
    /// Releasing linearly.
    Active,
    /// Fully vested.
    Completed,
    /// Reserved for suspension support; never produced by `vesting_status`.
    Paused,
}

/// Snapshot of one schedule at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VestingProgress {
    pub vested: u64,
    pub remaining: u64,
    pub withdrawn: u64,
    pub claimable: u64,
    pub status: VestingStatus,
}

/// Reject schedules that are not `start <= cliff <= end` with `end > start`.
pub fn validate_schedule(
    start_time: i64,
    cliff_time: i64,
    end_time: i64,
) -> Result<(), VestingError> {
    if end_time <= start_time || start_time > cliff_time || cliff_time > end_time {
        return Err(VestingError::InvalidSchedule);
    }
    Ok(())
}

pub fn vested_amount(
    start_time: i64,
    cliff_time: i64,
    end_time: i64,
    total_amount: u64,
    now: i64,
) -> Result<u64, VestingError> {
    if end_time <= start_time {
        return Err(VestingError::InvalidSchedule);
    }
    // End wins over the cliff so a schedule with cliff == end still pays out in full.
    if now >= end_time {
        return Ok(total_amount);
    }
    if now <= cliff_time {
        return Ok(0);
    }

    // now < end, so elapsed < duration; start may exceed now only when cliff < start.
    let elapsed = (now as i128) - (start_time as i128);
    if elapsed <= 0 {
        return Ok(0);
    }
    // Both factors are below 2^64 here, so the product fits in u128.
    let elapsed = elapsed as u128;
    let duration = ((end_time as i128) - (start_time as i128)) as u128;
    let vested = (total_amount as u128)
        .checked_mul(elapsed)
        .ok_or(VestingError::MathOverflow)?
        / duration;
    let vested = vested.min(total_amount as u128);
    u64::try_from(vested).map_err(|_| VestingError::MathOverflow)
}

/// Status under the same boundaries as `vested_amount`.
pub fn vesting_status(cliff_time: i64, end_time: i64, now: i64) -> VestingStatus {
    if now >= end_time {
        VestingStatus::Completed
    } else if now <= cliff_time {
        VestingStatus::Pending
    } else {
        VestingStatus::Active
    }
}

pub fn account_vested_amount(account: &EmployeeAccount, now: i64) -> Result<u64, VestingError> {
    vested_amount(
        account.start_time,
        account.cliff_time,
        account.end_time,
        account.total_amount,
        now,
    )
}

pub fn progress(account: &EmployeeAccount, now: i64) -> Result<VestingProgress, VestingError> {
    let vested = account_vested_amount(account, now)?;
    Ok(VestingProgress {
        vested,
        remaining: account.total_amount.saturating_sub(vested),
        withdrawn: account.total_withdrawn,
        claimable: vested.saturating_sub(account.total_withdrawn),
        status: vesting_status(account.cliff_time, account.end_time, now),
    })
}
