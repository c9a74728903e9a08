use anchor_lang::prelude::*;

/// Company-level escrow record. Seeds: `[company_name]`.
#[account]
#[derive(InitSpace, Debug, PartialEq, Eq)]
pub struct VestingAccount {
    /// Authority allowed to create employee accounts under this company.
    pub owner: Pubkey,
    /// Mint of the vested token.
    pub mint: Pubkey,
    /// Treasury token account PDA holding the escrowed supply.
    pub treasury_token_account: Pubkey,
    /// Human label, also the derivation seed of this account.
    /// Bounded by `MAX_COMPANY_NAME_LEN`.
    #[max_len(32)]
    pub company_name: String,
    pub treasury_bump: u8,
    pub bump: u8,
}
