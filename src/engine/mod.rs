//! Core engine — session state, screen bookkeeping, and the view simulator.

pub mod screens;
pub mod session;
pub mod simulator;
