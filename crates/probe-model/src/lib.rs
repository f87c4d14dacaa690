//! # probe-model
//!
//! Test-suite model for chainprobe.
//!
//! This crate provides:
//! - The ruleset table mapping network profiles to fork activation blocks
//! - JSON shapes for ethereum/tests blockchain and transaction suites
//! - `TestCase`, the unit of work, with its one-way status machine
//! - Genesis normalization (hex prefixes, 32-byte storage padding)
//! - Hex canonicalization and parsing helpers shared by the executor
//!
//! ## Suite Formats
//!
//! ### BlockchainTests
//! A genesis header, a pre-state, a list of RLP blocks and the expected
//! post-state (optionally the expected last block hash).
//!
//! ### TransactionTests
//! A single RLP transaction, sent to a node seeded with a fixed genesis.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod genesis;
pub mod hex_utils;
pub mod ruleset;
mod suite;
mod testcase;
mod types;

pub use error::{ModelError, ModelResult, ValidationError};
pub use genesis::{GenesisSpec, HEX_HEADER_FIELDS};
pub use hex_utils::{canonicalize, pad_hash};
pub use ruleset::{Fork, RulesetProfile, NEVER_ACTIVE};
pub use suite::TestSuiteFile;
pub use testcase::{CaseKind, Message, Payload, TestCase, TestStatus};
pub use types::*;

/// Re-export of the 256-bit integer used for balances and storage words
pub use primitive_types::U256;
