//! Core logic of the prompt refinement pipeline: conversation rounds with
//! model-backed agents, retrying throttled rounds, and the generator/critic
//! loop that produces a [`RefinementReport`].

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
mod error;
mod model_client;
mod refine;
pub mod retry;
pub mod round;
pub mod transcript;

pub use agent::{Agent, AgentBuilder};
pub use error::Error;
pub use refine::{
    APPROVAL_MARKER, DEFAULT_MAX_ITERATIONS, RefinementEvent,
    RefinementReport, Refiner, RefinerBuilder, extract_approved_prompt,
};
pub use retry::RetryPolicy;
pub use round::{Collaborator, Responder, Silent};
pub use transcript::{Message, Role, Transcript};
