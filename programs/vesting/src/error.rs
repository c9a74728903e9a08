use anchor_lang::prelude::*;

/// Custom error codes for the company vesting program.
#[error_code]
pub enum VestingError {
    #[msg("Invalid seed: empty, too long, or no valid bump")]
    InvalidSeed,

    #[msg("Invalid schedule: require start <= cliff <= end and end > start")]
    InvalidSchedule,

    #[msg("Unauthorized: signer is not the account's beneficiary or owner")]
    Unauthorized,

    #[msg("Nothing to claim")]
    NothingToClaim,

    #[msg("Treasury balance is below the claimable amount")]
    InsufficientTreasury,

    #[msg("Math overflow")]
    MathOverflow,
}
