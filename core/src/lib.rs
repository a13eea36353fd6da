// SPDX-License-Identifier: MIT

//! Hex dump engine of binextractor.
//!
//! Binary data, either from memory or from a reader, is cut into rows of
//! 16 bytes, repeated rows are collapsed into a `*` marker and the
//! remaining rows are rendered in the canonical hex dump layout:
//!
//! ```text
//! 00000000: 00 00 00 00 00 00 00 00  00 00 00 00 00 00 00 00  ................
//! *
//! 00000030: 30 31 32 33 34 35 36 37  38 39 61 62 63 64 65 66  0123456789abcdef
//! ```
//!
//! The structure description registry resolving field sizes, type keywords
//! and byte order lives in [`config`].
pub mod collapse;
pub mod config;
pub mod engine;
pub mod error;
pub mod hex_dump;
pub mod source;

pub use config::{ConfigRegistry, Endianness, FieldSpec, LogLevel};
pub use engine::{DumpEngine, DumpInput, DumpLines, Line, LineSink, WriteSink};
pub use error::{DumpError, Result};
pub use hex_dump::{dehex, dump, DumpLine, LineFormatter};
pub use source::{ByteChunk, ChunkSource};
