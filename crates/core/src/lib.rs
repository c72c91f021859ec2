//! Domain core for the character roster.
//!
//! Typed character records, the form flatten/unflatten mapping and schema,
//! and the session controller that drives listing, creating, editing and
//! saving. Persistence is reached only through the [`store::RecordStore`]
//! trait, so nothing here performs I/O on its own.

pub mod error;
pub mod form;
pub mod record;
pub mod session;
pub mod store;
pub mod types;
