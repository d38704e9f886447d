//! Infrastructure layer for the master application.
//!
//! Contains the adapters around the application core: the two channels that
//! cross the thread boundary, the transform engines, the TCP control plane,
//! and file-system storage for the configuration.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `sandbox_core`.  Only the simulation loop reaches back in here, and only for
//! the channel halves it owns.

pub mod channel;
pub mod engine;
pub mod network;
pub mod storage;
