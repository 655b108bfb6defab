//! Immediate execution of external command lines.
//!
//! A tokenized line is turned into a [`Pipeline`] (one process, or two joined
//! by `|`) with declarative stdin/stdout bindings, then spawned:
//!
//! - `cmd > file` / `cmd >> file`: stdout to a file created with mode `0644`
//! - `cmd < file`: stdin from a file
//! - `left | right`: left stdout feeds right stdin, only one `|` per line
//! - trailing `&`: do not wait (ignored for piped lines, which always wait)

pub mod plan;
pub mod spawn;

pub use plan::{Input, Output, Pipeline, Stage};
pub use spawn::{Launch, PipelineHandle};
