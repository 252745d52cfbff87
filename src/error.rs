//! Centralized error type for the nowloop umbrella crate.
//!
//! Wraps the core error so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] nowloop_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
