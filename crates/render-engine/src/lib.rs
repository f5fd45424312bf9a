//! Manim LiveView Render Engine
//!
//! Runs the external renderer for one scene and finds the video it wrote.
//!
//! # Render Flow
//!
//! ```text
//! RenderRequest ──► build_args ──► spawn renderer (cwd = workspace)
//!                                        │
//!                       stdout/stderr ───┼──► OutputSink (verbatim chunks)
//!                                        │
//!                                    exit status
//!                                   ┌────┴─────┐
//!                              non-zero        zero
//!                                 │              │
//!                  ExternalProcessFailed    locate(<media>/videos)
//!                                                │ miss
//!                                                ▼
//!                                     locate_in_output(stdout)
//!                                                │
//!                                     Ready(path) | NotFound
//! ```
//!
//! [`session::RenderSession`] sits on top and owns the last-run state used
//! for rerendering.

pub mod invoker;
pub mod locator;
pub mod session;
pub mod sink;

pub use invoker::*;
pub use locator::*;
pub use session::*;
pub use sink::*;
