//! Core logic of the assistant: the agent loop, tool dispatching and the
//! conversation state.
//!
//! An [`Agent`] answers one user message per [`Agent::submit`] call. It
//! sends the conversation to the model, runs the tools the model asks for
//! through a [`tool::Dispatcher`], feeds their results back, and stops once
//! the model answers in plain text.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod conversation;
mod model_client;
pub mod tool;

pub use agent::{
    Agent, AgentBuilder, AgentError, AgentTurn, ROUND_TRIP_LIMIT_NOTICE,
    TurnFinish,
};
