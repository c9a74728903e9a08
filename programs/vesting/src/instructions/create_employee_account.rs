use anchor_lang::prelude::*;

use crate::constants::EMPLOYEE_SEED;
use crate::error::VestingError;
use crate::state::{EmployeeAccount, VestingAccount};
use crate::utils::schedule;

pub fn create_employee_account_handler(
    ctx: Context<CreateEmployeeAccount>,
    start_time: i64,
    end_time: i64,
    total_amount: u64,
    cliff_time: i64,
) -> Result<()> {
    require_keys_eq!(
        ctx.accounts.owner.key(),
        ctx.accounts.vesting_account.owner,
        VestingError::Unauthorized
    );
    schedule::validate_schedule(start_time, cliff_time, end_time)?;

    let vesting_account_key = ctx.accounts.vesting_account.key();
    let employee = &mut ctx.accounts.employee_account;
    employee.beneficiary = ctx.accounts.beneficiary.key();
    employee.vesting_account = vesting_account_key;
    employee.start_time = start_time;
    employee.cliff_time = cliff_time;
    employee.end_time = end_time;
    employee.total_amount = total_amount;
    employee.total_withdrawn = 0;
    employee.bump = ctx.bumps.employee_account;

    emit!(EmployeeAccountCreated {
        employee_account: employee.key(),
        vesting_account: vesting_account_key,
        beneficiary: employee.beneficiary,
        start_time,
        cliff_time,
        end_time,
        total_amount,
    });

    Ok(())
}

#[derive(Accounts)]
pub struct CreateEmployeeAccount<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

    pub beneficiary: SystemAccount<'info>,

    #[account(has_one = owner @ VestingError::Unauthorized)]
    pub vesting_account: Account<'info, VestingAccount>,

    #[account(
        init,
        payer = owner,
        space = 8 + EmployeeAccount::INIT_SPACE,
        seeds = [EMPLOYEE_SEED, beneficiary.key().as_ref(), vesting_account.key().as_ref()],
        bump
    )]
    pub employee_account: Account<'info, EmployeeAccount>,

    pub system_program: Program<'info, System>,
}

#[event]
pub struct EmployeeAccountCreated {
    pub employee_account: Pubkey,
    pub vesting_account: Pubkey,
    pub beneficiary: Pubkey,
    pub start_time: i64,
    pub cliff_time: i64,
    pub end_time: i64,
    pub total_amount: u64,
}
