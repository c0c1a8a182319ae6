// src/handlers/mod.rs

pub mod analysis;
pub mod exams;
pub mod scoring;
pub mod stats;
