//! terrapin-seq-demo: how dropped packets shift implicit sequence numbers
//!
//! SSH's Binary Packet Protocol numbers packets implicitly, one counter per
//! direction. An on-path attacker who removes packets early in a handshake
//! shifts the numbers of everything after them in that direction. This crate
//! models that over a synthetic trace, with no real protocol, crypto or I/O
//! beyond reading the trace and config files.
//!
//! Pipeline: `trace_reader` → `sequence` (baseline) → `selector` →
//! `drop_sim` → `sequence` (post-drop) → `diff`, wrapped by `pipeline`.

pub mod api;
pub mod config;
pub mod diff;
pub mod drop_sim;
pub mod error;
pub mod packet;
pub mod pipeline;
pub mod report;
pub mod selector;
pub mod sequence;
pub mod trace_reader;

pub use error::{DemoError, Result};
pub use packet::{Direction, Packet};
