//! Decision engine for inbound calls

pub mod engine;

pub use engine::{decide_direct_line, decide_routed, Decision, DecisionConfig, DecisionEngine};
