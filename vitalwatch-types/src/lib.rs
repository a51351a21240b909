//! # vitalwatch-types
//!
//! Core types for vital-sign monitoring. This crate defines the schema shared
//! by the vitalwatch pipeline, its data sources and anything consuming its
//! output: the closed set of measurement [`Channel`]s, raw and enriched
//! readings, and threshold [`Alert`]s.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature as needed
//! - **Closed channel set**: Every measurement stream is a [`Channel`] variant, so
//!   per-channel tables can be matched exhaustively
//!
//! ## Features
//!
//! - `std` (default): Standard library support (wall-clock timestamps)
//! - `serde`: JSON/etc. serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use vitalwatch_types::{Channel, RawReading};
//!
//! let reading = RawReading::with_timestamp(1_700_000_000_000)
//!     .with(Channel::HeartRate, 72.0)
//!     .with(Channel::Spo2, 98.0);
//!
//! assert_eq!(reading.len(), 2);
//! assert_eq!(reading.get(Channel::HeartRate), Some(72.0));
//! assert!(reading.get(Channel::BloodSugar).is_none());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod alert;
mod channel;
mod reading;

pub use alert::*;
pub use channel::*;
pub use reading::*;
