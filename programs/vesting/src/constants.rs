//! Program-wide constants.

/// Seed prefix of the treasury token account PDA.
pub const TREASURY_SEED: &[u8] = b"vesting_treasury";

/// Seed prefix of the employee vesting account PDA.
pub const EMPLOYEE_SEED: &[u8] = b"employee_vesting";

/// Longest company name accepted, in bytes. Matches the PDA seed length limit.
pub const MAX_COMPANY_NAME_LEN: usize = 32;

/// Longest single seed component accepted by the address deriver.
pub const MAX_SEED_LEN: usize = 32;

/// Most seed components a single derivation may carry.
pub const MAX_SEEDS: usize = 16;

/// Most instants a single projected timeline may hold.
pub const MAX_TIMELINE_POINTS: usize = 1024;
