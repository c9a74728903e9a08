//! Program-derived addresses for company, treasury and employee accounts.
//!
//! Every address here is a pure function of its seeds and the program id, so
//! any party can recompute it without reading the ledger.

use anchor_lang::prelude::Pubkey;

use crate::constants::{
    EMPLOYEE_SEED, MAX_COMPANY_NAME_LEN, MAX_SEEDS, MAX_SEED_LEN, TREASURY_SEED,
};
use crate::error::VestingError;

/// Derive `(address, bump)` for `seeds` under `program_id`.
pub fn derive(seeds: &[&[u8]], program_id: &Pubkey) -> Result<(Pubkey, u8), VestingError> {
    // The bump occupies one of the seed slots.
    if seeds.len() >= MAX_SEEDS {
        return Err(VestingError::InvalidSeed);
    }
    if seeds.iter().any(|s| s.len() > MAX_SEED_LEN) {
        return Err(VestingError::InvalidSeed);
    }
    Pubkey::try_find_program_address(seeds, program_id).ok_or(VestingError::InvalidSeed)
}

/// Company names are seeds: non-empty, at most 32 bytes, no control characters.
pub fn validate_company_name(company_name: &str) -> Result<(), VestingError> {
    if company_name.is_empty()
        || company_name.len() > MAX_COMPANY_NAME_LEN
        || company_name.chars().any(char::is_control)
    {
        return Err(VestingError::InvalidSeed);
    }
    Ok(())
}

pub fn company_address(
    company_name: &str,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), VestingError> {
    validate_company_name(company_name)?;
    derive(&[company_name.as_bytes()], program_id)
}

pub fn treasury_address(
    company_name: &str,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), VestingError> {
    validate_company_name(company_name)?;
    derive(&[TREASURY_SEED, company_name.as_bytes()], program_id)
}

pub fn employee_address(
    beneficiary: &Pubkey,
    company: &Pubkey,
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), VestingError> {
    derive(&[EMPLOYEE_SEED, beneficiary.as_ref(), company.as_ref()], program_id)
}

/// ATA derivation: PDA(owner, token_program_id, mint) under the associated token program.
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    let seeds: &[&[u8]] = &[
        owner.as_ref(),
        anchor_spl::token::ID.as_ref(),
        mint.as_ref(),
    ];
    let (ata, _) = Pubkey::find_program_address(seeds, &anchor_spl::associated_token::ID);
    ata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_address_is_deterministic() {
        let a = company_address("Gradify", &crate::ID).unwrap();
        let b = company_address("Gradify", &crate::ID).unwrap();
        assert_eq!(a, b);

        let (expected, bump) = Pubkey::find_program_address(&[b"Gradify"], &crate::ID);
        assert_eq!(a, (expected, bump));
    }

    #[test]
    fn distinct_names_yield_distinct_addresses() {
        let (a, _) = company_address("TechCorp Solutions", &crate::ID).unwrap();
        let (b, _) = company_address("InnovateLabs Inc", &crate::ID).unwrap();
        assert_ne!(a, b);

        // Same name, different role: company vs treasury never collide.
        let (t, _) = treasury_address("TechCorp Solutions", &crate::ID).unwrap();
        assert_ne!(a, t);
    }

    #[test]
    fn employee_address_depends_on_both_parties() {
        let (company_a, _) = company_address("A", &crate::ID).unwrap();
        let (company_b, _) = company_address("B", &crate::ID).unwrap();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();

        let (a1, _) = employee_address(&alice, &company_a, &crate::ID).unwrap();
        let (a2, _) = employee_address(&alice, &company_b, &crate::ID).unwrap();
        let (b1, _) = employee_address(&bob, &company_a, &crate::ID).unwrap();
        assert_ne!(a1, a2);
        assert_ne!(a1, b1);
        assert_eq!(a1, employee_address(&alice, &company_a, &crate::ID).unwrap().0);
    }

    #[test]
    fn rejects_bad_company_names() {
        assert!(matches!(
            company_address("", &crate::ID),
            Err(VestingError::InvalidSeed)
        ));
        let long = "x".repeat(MAX_COMPANY_NAME_LEN + 1);
        assert!(matches!(
            treasury_address(&long, &crate::ID),
            Err(VestingError::InvalidSeed)
        ));
        assert!(matches!(
            company_address("bad\0name", &crate::ID),
            Err(VestingError::InvalidSeed)
        ));
        // Exactly at the limit is fine.
        let max = "y".repeat(MAX_COMPANY_NAME_LEN);
        assert!(company_address(&max, &crate::ID).is_ok());
    }

    #[test]
    fn rejects_oversized_or_too_many_seeds() {
        let big = [7u8; MAX_SEED_LEN + 1];
        assert!(matches!(
            derive(&[&big], &crate::ID),
            Err(VestingError::InvalidSeed)
        ));
        let seeds: Vec<&[u8]> = vec![b"s".as_slice(); MAX_SEEDS];
        assert!(matches!(
            derive(&seeds, &crate::ID),
            Err(VestingError::InvalidSeed)
        ));
    }
}
