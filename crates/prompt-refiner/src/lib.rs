//! An out-of-the-box prompt refiner that pairs a prompt generator with a
//! prompt critic on an Azure OpenAI deployment.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to bring prompt refinement into your own host apps.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

mod config;
mod pipeline;
mod progress;

pub use config::{Config, ConfigError};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use progress::{FailureNotice, StatusLine};

/// Re-exports of [`prompt_refiner_core`] crate.
pub mod core {
    pub use prompt_refiner_core::*;
}
