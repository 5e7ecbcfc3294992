//! Command-line harness for the Ledger connector bridge.
//!
//! `ledger-connect run` feeds newline-delimited JSON from stdin into a
//! [`Bridge`](ledger_connect_runtime::Bridge) backed by a simulated device
//! and prints every reply as a JSON line on stdout. Logs go to stderr.

pub mod bus;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod harness;
pub mod logging;
pub mod samples;
pub mod store;
