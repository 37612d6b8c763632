//! PWG Raster / Apple Raster (URF) / CUPS raster stream codec.
//!
//! This crate has no dependency on any other workspace crate: it is a pure
//! codec over a caller-supplied `Read`/`Write` sink, the way the library it
//! is grounded on (`cups/raster-stream.c`) is a pure codec over a
//! caller-supplied file descriptor or I/O callback.

pub mod apple;
pub mod error;
pub mod header;
pub mod io;
pub mod packbits;
pub mod reader;
pub mod sync;
pub mod writer;

pub use error::{RasterError, Result};
pub use header::RasterHeader;
pub use reader::RasterReader;
pub use sync::{ByteOrder, SyncWord};
pub use writer::{Dialect, RasterWriter};
