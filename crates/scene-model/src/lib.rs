//! Manim LiveView Scene Model
//!
//! Defines the data contracts shared between scene discovery and rendering:
//! - **Scenes:** classes in a Python file that derive from a Manim scene type
//! - **Quality:** the five render presets and their flag/directory tokens
//! - **Requests:** what to render, and the remembered last run
//!
//! Discovery is line-pattern matching over source text. It never parses
//! Python and never checks that a discovered class actually renders.

pub mod quality;
pub mod request;
pub mod scene;

pub use quality::*;
pub use request::*;
pub use scene::*;
