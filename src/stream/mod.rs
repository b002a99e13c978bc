//! Paced output of answers and thinking steps.

mod emitter;
mod jitter;

pub use emitter::{EmitterOptions, Sink, TextEmitter};
pub use jitter::{FixedJitter, Jitter, NoJitter, RandomJitter, scaled, spread};
