use anchor_lang::prelude::*;

/// Per-beneficiary schedule and withdrawal history.
/// Seeds: `[b"employee_vesting", beneficiary, vesting_account]`.
#[account]
#[derive(InitSpace, Debug, PartialEq, Eq)]
pub struct EmployeeAccount {
    /// Only this identity may claim.
    pub beneficiary: Pubkey,
    /// Owning company account.
    pub vesting_account: Pubkey,
    /// Unix seconds.
    pub start_time: i64,
    /// Unix seconds; nothing is released up to and including this instant.
    pub cliff_time: i64,
    /// Unix seconds; everything is released from this instant on.
    pub end_time: i64,
    pub total_amount: u64,
    /// Cumulative amount released. Only ever increases.
    pub total_withdrawn: u64,
    pub bump: u8,
}
