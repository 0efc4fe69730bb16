// lib.rs
#![no_std]

pub mod export;
pub mod protocol;
pub mod responder;

pub use export::{export_status, format_status_line, ExportError};
pub use protocol::*;
pub use responder::*;
