//! Chess rules for square boards from 8×8 to 16×16.
//!
//! Position text codec, legal move generation, move application with game
//! status, and perft move-tree counting.

pub mod config;
pub mod engine;
