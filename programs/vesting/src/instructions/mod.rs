pub mod claim_tokens;
pub mod create_employee_account;
pub mod create_vesting_account;
pub mod quote_vesting;

pub use claim_tokens::*;
pub use create_employee_account::*;
pub use create_vesting_account::*;
pub use quote_vesting::*;
