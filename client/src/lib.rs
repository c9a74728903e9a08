//! Off-chain side of the company vesting program.
//!
//! [`VestingClient`] is the entry point for presentation and CLI layers. It
//! reads accounts through a [`VestingRepository`], either a ledger-backed one
//! or the in-process sample portfolio, and submits instructions in two
//! phases: a [`Pending`] receipt first, a [`Finality`] once the source has
//! executed the instruction. All vesting arithmetic comes from the
//! `company_vesting` engine, so the numbers shown here are the ones the
//! program enforces.

pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod memory_ledger;
pub mod repository;

pub use client::{EmployeeSummary, Finality, Pending, VestingClient};
pub use config::{ClientConfig, DataSource};
pub use error::{ClientError, Result};
pub use ledger::{
    ActivityEntry, Ledger, LedgerError, LedgerEvent, Signature, TransactionStatus,
    VestingInstruction,
};
pub use memory_ledger::InMemoryLedger;
pub use repository::{LedgerRepository, MockRepository, Record, VestingRepository};
