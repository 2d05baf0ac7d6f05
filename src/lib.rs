//! LinkedIn post generator
//!
//! Turns a topic into a ready-to-publish LinkedIn post written in Rioplatense
//! Spanish plus a square illustration. Generation runs through remote
//! text/image models behind a small async state machine that a console
//! front end observes.

pub mod ai;
pub mod app;
pub mod console;
pub mod error;
pub mod models;
pub mod output;
pub mod prompts;
pub mod share;
pub mod workflow;

pub use error::{Error, Result};
