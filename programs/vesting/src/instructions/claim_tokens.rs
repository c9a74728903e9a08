use anchor_lang::prelude::*;
use anchor_spl::associated_token::AssociatedToken;
use anchor_spl::token::{self, Mint, Token, TokenAccount, Transfer};

use crate::constants::{EMPLOYEE_SEED, TREASURY_SEED};
use crate::error::VestingError;
use crate::state::{EmployeeAccount, VestingAccount};
use crate::utils::claim;

pub fn claim_tokens_handler(ctx: Context<ClaimTokens>, company_name: String) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let beneficiary = ctx.accounts.beneficiary.key();

    let (released, updated) = claim::claim(&ctx.accounts.employee_account, now, &beneficiary)?;
    require!(
        ctx.accounts.treasury_token_account.amount >= released,
        VestingError::InsufficientTreasury
    );

    // Treasury is its own authority; sign with its PDA seeds.
    let treasury_bump = ctx.accounts.vesting_account.treasury_bump;
    let signer_seeds: &[&[&[u8]]] = &[&[TREASURY_SEED, company_name.as_bytes(), &[treasury_bump]]];
    token::transfer(
        CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.treasury_token_account.to_account_info(),
                to: ctx.accounts.employee_token_account.to_account_info(),
                authority: ctx.accounts.treasury_token_account.to_account_info(),
            },
            signer_seeds,
        ),
        released,
    )?;

    let employee = &mut ctx.accounts.employee_account;
    employee.total_withdrawn = updated.total_withdrawn;

    msg!("Released {} to {}", released, beneficiary);
    emit!(TokensClaimed {
        employee_account: employee.key(),
        vesting_account: employee.vesting_account,
        beneficiary,
        amount: released,
        total_withdrawn: employee.total_withdrawn,
        time: now,
    });

    Ok(())
}

#[derive(Accounts)]
#[instruction(company_name: String)]
pub struct ClaimTokens<'info> {
    #[account(mut)]
    pub beneficiary: Signer<'info>,

    #[account(
        seeds = [company_name.as_bytes()],
        bump = vesting_account.bump,
        has_one = treasury_token_account,
        has_one = mint,
    )]
    pub vesting_account: Account<'info, VestingAccount>,

    #[account(
        mut,
        seeds = [EMPLOYEE_SEED, beneficiary.key().as_ref(), vesting_account.key().as_ref()],
        bump = employee_account.bump,
        has_one = beneficiary @ VestingError::Unauthorized,
        has_one = vesting_account,
    )]
    pub employee_account: Account<'info, EmployeeAccount>,

    pub mint: Account<'info, Mint>,

    #[account(mut)]
    pub treasury_token_account: Account<'info, TokenAccount>,

    #[account(
        init_if_needed,
        payer = beneficiary,
        associated_token::mint = mint,
        associated_token::authority = beneficiary,
    )]
    pub employee_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

#[event]
pub struct TokensClaimed {
    pub employee_account: Pubkey,
    pub vesting_account: Pubkey,
    pub beneficiary: Pubkey,
    pub amount: u64,
    pub total_withdrawn: u64,
    pub time: i64,
}
