//! Coop Console
//!
//! Admin and member console for a society's loan ledger and monthly contributions. Talks to
//! the society backend over REST, or reads a directory of saved responses offline, and
//! renders the projections from the `projections` crate.
//!
//! # Architecture
//!
//! - **Sources**: [`client::LedgerSource`] reads, [`client::SocietyApi`] adds mutations;
//!   implemented by [`HttpSocietyApi`] and [`SnapshotSource`]
//! - **Session**: explicit [`Session`] passed into every call
//! - **Views**: terminal-independent view models in [`views`]
//! - **Actions**: validated mutations in [`actions`]

pub mod actions;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod views;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{HttpSocietyApi, LedgerSource, SocietyApi};
pub use config::ConsoleConfig;
pub use error::ApiError;
pub use session::{Session, SessionUser};
pub use snapshot::SnapshotSource;
