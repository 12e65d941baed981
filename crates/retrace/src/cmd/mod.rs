//! Command modules for the retrace CLI

pub mod debug;
pub mod json;
pub mod serve;

pub use debug::debug_trace;
pub use json::run_json_stdio;
pub use serve::serve_trace;
