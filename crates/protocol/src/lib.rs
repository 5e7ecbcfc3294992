//! Wire types for the Ledger connector protocol.
//!
//! This crate contains the serde-serializable types exchanged between a
//! wallet page and the connector page over the window message bus, plus the
//! typed parameter shapes each hardware operation accepts. These types
//! represent the "protocol layer": the shapes of data as they appear on the
//! wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: no behavior beyond serialization and parameter validation
//! * Stable: `Action` strings and `ErrorCode` values are a contract external
//!   callers depend on and change only when the wire protocol changes
//!
//! Session handling, device access and error translation live in
//! `ledger-connect-runtime`.

pub mod error_code;
pub mod message;
pub mod params;
pub mod path;
pub mod response;
pub mod types;

pub use error_code::ErrorCode;
pub use message::{ErrorPayload, InboundMessage, Reply, WireReply};
pub use params::*;
pub use path::{DerivationPath, HARDENED, MAX_PATH_LEN};
pub use response::*;
pub use types::*;
