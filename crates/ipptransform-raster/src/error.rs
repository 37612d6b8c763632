//! Error taxonomy for the raster stream codec.

use std::fmt;
use std::sync::Mutex;

/// Errors produced while reading or writing a raster stream.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognized sync word {0:#010x}")]
    BadSyncWord(u32),

    #[error("malformed page header: {0}")]
    MalformedHeader(String),

    #[error("unsupported colorspace/bits-per-pixel combination: colorspace={colorspace}, bits_per_pixel={bits_per_pixel}")]
    UnsupportedPixelFormat { colorspace: u32, bits_per_pixel: u32 },

    #[error("compression overrun: row produced more bytes than cupsBytesPerLine allows")]
    CompressionOverrun,

    #[error("stream ended before the declared page height was read")]
    UnexpectedEof,

    #[error("stream is not open for {0}")]
    WrongDirection(&'static str),
}

pub type Result<T> = std::result::Result<T, RasterError>;

/// Retains the last error message produced by a reader or writer, mirroring
/// `cupsRasterGetErrorString()`'s accumulation of a single last-error string
/// rather than a bare error code.
#[derive(Debug, Default)]
pub struct LastError(Mutex<Option<String>>);

impl LastError {
    pub fn new() -> Self {
        Self(Mutex::new(None))
    }

    pub fn set(&self, message: impl Into<String>) {
        *self.0.lock().expect("last-error mutex poisoned") = Some(message.into());
    }

    pub fn record(&self, err: &RasterError) {
        self.set(err.to_string());
    }

    pub fn get(&self) -> Option<String> {
        self.0.lock().expect("last-error mutex poisoned").clone()
    }
}

impl fmt::Display for LastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(msg) => write!(f, "{msg}"),
            None => write!(f, "no error"),
        }
    }
}
