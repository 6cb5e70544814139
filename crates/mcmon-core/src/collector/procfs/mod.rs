//! Readers for the Linux `/proc` filesystem.
//!
//! This module provides parsers and a reader for the CPU and memory counter
//! files of the `/proc` virtual filesystem.

pub mod parser;
pub mod reader;

pub use parser::{CoreCounterSample, ParseError};
pub use reader::{CollectError, CounterReader};
