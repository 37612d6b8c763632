//! The byte-sink/byte-source capability the codec reads and writes through.
//!
//! The original codec took a `cupsRasterOpenIO`-style function pointer plus
//! an opaque context (`cups_raster_cb_t`) returning bytes transferred or -1.
//! Rust already has that exact capability as `std::io::Read`/`std::io::Write`
//! (`-1` becomes `Err`, partial/zero reads are represented directly), so RSC
//! is generic over those traits instead of re-inventing a callback type.

pub use std::io::{Read, Write};
