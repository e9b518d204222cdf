//! # vehiclehub-domain
//!
//! Pure domain model for the vehiclehub automation system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Keys** (canonical fact names) and **Values** (typed fact payloads)
//! - Define **Entries** (a value plus its bookkeeping: write count, last update)
//! - Define **Events** (state-change records broadcast to live consumers)
//! - Define the **power policy** deciding whether a module should be switched
//! - Decode **serial frames** into a closed set of field kinds
//! - Convert raw ADC readings into physical units
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod conversion;
pub mod entry;
pub mod event;
pub mod frame;
pub mod key;
pub mod power;
pub mod value;
