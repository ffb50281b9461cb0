//! An abstraction layer for the chat models behind the refinement agents.
//!
//! This crate establishes a small protocol that the agents use to talk to
//! a language model backend, so that the refinement pipeline can switch
//! between hosted deployments and scripted fakes without touching the
//! core code.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
