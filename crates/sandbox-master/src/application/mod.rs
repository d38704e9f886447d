//! Application layer use cases for the master application.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure data) and the infrastructure (OS/network/storage).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a goal (e.g., "register the
//!   kinect that just announced itself").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the transform engine and the channels can be swapped in tests.
//! - **Contain no network I/O and no file system access**.
//!
//! # Sub-modules
//!
//! - **`manage_clients`**   – The append-only registry of kinects and beamers.
//!
//! - **`dispatch_command`** – Validates one inbound command and applies exactly
//!   one effect: a registry insert or a calibration update.
//!
//! - **`calibrate`**        – The [`calibrate::TransformEngine`] seam and the
//!   ordering rules for pushing calibration groups into it.
//!
//! - **`simulation_loop`**  – The main loop: drain one command, render, offer
//!   the frame, sleep when idle.  This is the only owner of the registry.

pub mod calibrate;
pub mod dispatch_command;
pub mod manage_clients;
pub mod simulation_loop;
