//! Scriptforge - Short-Form Video Script Wizard (Core Engine)
//!
//! Workflow engine driving the multi-step script-generation wizard:
//! step state machine, conversational refinement, the generation
//! request pipeline, quality scoring, and session persistence.

pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
