//! Domain entities for the augmented sandbox.
//!
//! This module contains pure data types with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Contains the core vocabulary of the application.
//! - Has **no** imports from OS APIs, network libraries, or async runtimes.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Code in outer layers (infrastructure, application) depends on the domain,
//! but the domain never depends on them.

/// Height-to-image calibration parameters and the updates that change them.
pub mod calibration;

/// Registered input (kinect) and output (beamer) device records.
pub mod client;

/// Requests travelling from the control plane to the simulation loop.
pub mod command;

/// The greyscale raster that is projected onto the sand.
pub mod frame;
