use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::TREASURY_SEED;
use crate::state::VestingAccount;
use crate::utils::pda;

pub fn create_vesting_account_handler(
    ctx: Context<CreateVestingAccount>,
    company_name: String,
) -> Result<()> {
    // Seeds longer than 32 bytes already fail PDA derivation; empty or
    // control-character names are caught here.
    pda::validate_company_name(&company_name)?;

    let va = &mut ctx.accounts.vesting_account;
    va.owner = ctx.accounts.signer.key();
    va.mint = ctx.accounts.mint.key();
    va.treasury_token_account = ctx.accounts.treasury_token_account.key();
    va.company_name = company_name;
    va.treasury_bump = ctx.bumps.treasury_token_account;
    va.bump = ctx.bumps.vesting_account;

    msg!("Vesting account created for {}", va.company_name);
    emit!(VestingAccountCreated {
        vesting_account: va.key(),
        owner: va.owner,
        mint: va.mint,
        treasury_token_account: va.treasury_token_account,
        company_name: va.company_name.clone(),
    });

    Ok(())
}

#[derive(Accounts)]
#[instruction(company_name: String)]
pub struct CreateVestingAccount<'info> {
    #[account(mut)]
    pub signer: Signer<'info>,

    #[account(
        init,
        payer = signer,
        space = 8 + VestingAccount::INIT_SPACE,
        seeds = [company_name.as_bytes()],
        bump
    )]
    pub vesting_account: Account<'info, VestingAccount>,

    pub mint: Account<'info, Mint>,

    #[account(
        init,
        payer = signer,
        token::mint = mint,
        token::authority = treasury_token_account,
        seeds = [TREASURY_SEED, company_name.as_bytes()],
        bump
    )]
    pub treasury_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

#[event]
pub struct VestingAccountCreated {
    pub vesting_account: Pubkey,
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub treasury_token_account: Pubkey,
    pub company_name: String,
}
