//! Authentication layer
//!
//! Error message translation and the process-wide session controller.
//! The network-facing auth client itself lives in `backend::auth`; this
//! module owns the user-visible side: translated failure messages,
//! lifecycle state, and the derived display values.

pub mod controller;
pub mod messages;

pub use controller::{Lifecycle, SessionController};
