// Copyright (c) 2025 - Cowboy AI, Inc.

//! Store adapter implementations
//!
//! This module contains concrete implementations of the AddressSpaceStore
//! trait for external asset databases.

#[cfg(feature = "racktables")]
pub mod racktables;

#[cfg(feature = "racktables")]
pub use racktables::RackTablesStore;
