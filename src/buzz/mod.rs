// Buzz arbitration: the per-room Open/Locked state machine

pub use engine::{BuzzOutcome, RelaunchOutcome, ResetOutcome};

pub mod engine;
