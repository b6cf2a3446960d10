//! Core pipeline for a conversational image-generation bot
//!
//! Drives the FusionBrain text-to-image service from prompt to finished
//! image, with per-user sessions, size/style settings, and an optional
//! background-removal step backed by a content-addressed result cache.
//! Message routing, menus, and user-facing text live in the presentation
//! layer and are not part of this crate.

pub mod api;
pub mod error;
pub mod image;
pub mod job;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod session;

pub use error::{Error, Result};
