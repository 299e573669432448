//! VisionBuddy, an eye-care assistant that answers questions from a local
//! textbook index, web search, medical news feeds and WHO disease pages.
//!
//! The crate ships a CLI for chatting in the terminal. It can also be used as
//! a library through [`SessionBuilder`], which assembles the agent with all
//! the built-in tools.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

mod config;
mod index;
mod session;
pub mod tools;

pub use config::{CliConfig, ConfigError};
pub use index::{CHUNK_OVERLAP, CHUNK_SIZE, IndexError, LexicalIndex};
pub use session::{DEFAULT_SYSTEM_PROMPT, Session, SessionBuilder};

/// Re-exports of [`vision_buddy_core`] crate.
pub mod core {
    pub use vision_buddy_core::*;
}
