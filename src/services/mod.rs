// src/services/mod.rs

pub mod catalog;
pub mod sessions;
