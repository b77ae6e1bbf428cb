//! Chat session state and the controller that drives it
//!
//! - Session: the shared, cloneable conversation handle
//! - SessionController: turns user text into a streamed, settled reply

pub mod controller;
pub mod session;

pub use controller::{SendOutcome, SessionController, FAILURE_NOTICE};
pub use session::{LastError, Session, DEFAULT_GREETING};
