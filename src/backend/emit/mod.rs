//! Code emission for IR constructs
//!
//! `functions` lays out the block dispatcher of a function body;
//! `instructions` translates the instructions and terminators inside it.

pub(super) mod functions;
pub(super) mod instructions;
