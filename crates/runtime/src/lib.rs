//! Session bridge for the Ledger connector page.
//!
//! The connector accepts one hardware operation per page load from the
//! wallet page, opens a transport to the device, checks whether the device
//! is PIN-locked, runs the operation and posts exactly one reply back.
//!
//! # Components
//!
//! - [`Bridge`]: inbound message handling, one-request-per-session rule,
//!   reply emission
//! - [`Dispatcher`]: parameter validation, transport scope, device calls
//! - [`LockDetector`]: version-query vs. timer race
//! - [`TransportAcquirer`]: transport identifier to open transport
//! - [`translate`]: device/transport error to wire [`ErrorCode`]
//! - [`SessionCell`]: session state with read-only subscriptions
//!
//! Device access, transports, persisted state and the page bus are traits
//! ([`DeviceApp`], [`TransportFactory`], [`DeviceCodeStore`],
//! [`MessageBus`]); [`simulated`] provides in-memory implementations.
//!
//! [`ErrorCode`]: ledger_connect_protocol::ErrorCode

mod acquire;
mod bridge;
mod bus;
mod config;
mod device;
mod dispatch;
mod error;
mod lock;
mod session;
pub mod simulated;
mod store;
mod translate;

pub use acquire::TransportAcquirer;
pub use bridge::{Bridge, Inbound};
pub use bus::{MessageBus, WindowEvent};
pub use config::{CONNECTOR_TARGET, ConnectorConfig, DEVICE_LOCK_CHECK_TIMEOUT_MS, WILDCARD_ORIGIN};
pub use device::{DeviceApp, DeviceError, Transport, TransportFactory};
pub use dispatch::Dispatcher;
pub use error::{BridgeError, DispatchError, StoreError};
pub use lock::LockDetector;
pub use session::{Admission, LOCKED_STEP_OFFSET, PendingRequest, RequestSlot, Session, SessionCell};
pub use store::{DeviceCodeStore, MemoryDeviceCodeStore};
pub use translate::{translate, translate_device_error};
