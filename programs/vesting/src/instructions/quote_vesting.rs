use anchor_lang::prelude::*;

use crate::state::EmployeeAccount;
use crate::utils::schedule::{self, VestingStatus};

pub fn quote_vesting_handler(ctx: Context<QuoteVesting>) -> Result<u64> {
    let employee = &ctx.accounts.employee_account;
    let now = Clock::get()?.unix_timestamp;
    let progress = schedule::progress(employee, now)?;

    emit!(VestingQuote {
        employee_account: employee.key(),
        beneficiary: employee.beneficiary,
        vested_amount: progress.vested,
        total_withdrawn: progress.withdrawn,
        claimable: progress.claimable,
        status: progress.status,
    });

    Ok(progress.claimable)
}

#[derive(Accounts)]
pub struct QuoteVesting<'info> {
    pub employee_account: Account<'info, EmployeeAccount>,
}

#[event]
pub struct VestingQuote {
    pub employee_account: Pubkey,
    pub beneficiary: Pubkey,
    pub vested_amount: u64,
    pub total_withdrawn: u64,
    pub claimable: u64,
    pub status: VestingStatus,
}
