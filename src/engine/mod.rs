// src/engine/mod.rs

//! Quiz session and scoring engine.
//!
//! Synchronous and storage-free: the service layer feeds it quizzes, clock
//! values and user commands, and persists what it produces.

pub mod error;
pub mod progression;
pub mod result;
pub mod session;

pub use error::EngineError;
pub use progression::{Progression, ProgressionChange, Rank};
pub use result::Grade;
pub use session::{Session, SessionStatus, Tick};
