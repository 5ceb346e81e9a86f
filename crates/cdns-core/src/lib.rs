//! Core types for the C-DNS (RFC 8618) encoder.
//!
//! This crate provides the building blocks shared by the block and exporter
//! layers in the `cdns` crate:
//!
//! - **Tables**: [`DedupTable`], the content-addressed store behind every
//!   block table, and the [`TableKey`] identity trait
//! - **Types**: table entities, generic input records, timestamps and the
//!   RFC 8618 enumerations and flag sets
//! - **Errors**: [`CdnsError`] and the crate [`Result`] alias
//!
//! # Example
//!
//! ```rust
//! use cdns_core::{ClassType, DedupTable};
//!
//! let mut table = DedupTable::new();
//! let a = table.add(ClassType::new(1, 1));
//! let aaaa = table.add(ClassType::new(28, 1));
//! assert_eq!(table.add(ClassType::new(1, 1)), a);
//! assert_eq!((a, aaaa), (0, 1));
//! ```

mod error;
pub mod table;
pub mod types;

pub use error::{CdnsError, Result};
pub use table::{DedupTable, Index, TableKey};
pub use types::*;
