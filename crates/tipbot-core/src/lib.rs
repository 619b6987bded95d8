//! Core domain + application logic for the CULT tip bot.
//!
//! This crate is framework-agnostic. The chat transport, the ledger database and
//! the token network live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod ledger;
pub mod logging;
pub mod messaging;
pub mod parser;
pub mod payout;
pub mod replies;
pub mod status;

pub use errors::{Error, Result};
