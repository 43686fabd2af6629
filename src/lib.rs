//! # kws-edge
//!
//! Always-on keyword spotting for small devices. A dedicated thread records
//! audio in fixed chunks while the main thread turns the previous chunk into
//! a rolling feature tensor, classifies it and smooths the scores into
//! command detections.

pub mod audio;
pub mod config;
pub mod detection;
pub mod error;
pub mod features;
pub mod models;

pub use error::{EdgeError, Result};
