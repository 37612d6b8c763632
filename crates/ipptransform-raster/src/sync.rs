//! Raster stream sync words and the byte order they imply.
//!
//! A raster stream opens with a 4-byte sync word that identifies both the
//! header version (v1/v2/v3/Apple) and the byte order the rest of the fixed
//! header was written in. PWG Raster always uses the v2 word in network
//! byte order; CUPS raster historically let the writer's host order show
//! through, which is why a reader has to branch on the sync word it saw
//! rather than assume one order.

use crate::error::{RasterError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    pub fn host() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    pub fn is_swapped(self) -> bool {
        self != Self::host()
    }
}

/// Which raster dialect a stream's sync word selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncWord {
    /// `RaSt`/`tSaR` — version 1 (obsolete, pre-2.1) CUPS raster.
    V1,
    /// `RaS2`/`2SaR` — version 2 CUPS raster, identical wire format to PWG Raster.
    V2,
    /// `RaS3`/`3SaR` — version 3 CUPS raster (adds vendor string fields).
    V3,
    /// `UNIR`/`RINU` — Apple Raster (URF), fixed 32-byte packed header.
    Apple,
}

impl SyncWord {
    pub const V1_BE: u32 = u32::from_be_bytes(*b"RaSt");
    pub const V1_LE: u32 = u32::from_be_bytes(*b"tSaR");
    pub const V2_BE: u32 = u32::from_be_bytes(*b"RaS2");
    pub const V2_LE: u32 = u32::from_be_bytes(*b"2SaR");
    pub const V3_BE: u32 = u32::from_be_bytes(*b"RaS3");
    pub const V3_LE: u32 = u32::from_be_bytes(*b"3SaR");
    pub const APPLE_BE: u32 = u32::from_be_bytes(*b"UNIR");
    pub const APPLE_LE: u32 = u32::from_be_bytes(*b"RINU");

    /// The sync word PWG Raster mandates: the v2 word, always network order.
    pub const PWG: Self = SyncWord::V2;

    /// Decode a 4-byte sync word read as a big-endian `u32`, returning the
    /// dialect and the byte order the rest of the stream was written in.
    pub fn decode(raw_be: u32) -> Result<(Self, ByteOrder)> {
        match raw_be {
            Self::V1_BE => Ok((SyncWord::V1, ByteOrder::BigEndian)),
            Self::V1_LE => Ok((SyncWord::V1, ByteOrder::LittleEndian)),
            Self::V2_BE => Ok((SyncWord::V2, ByteOrder::BigEndian)),
            Self::V2_LE => Ok((SyncWord::V2, ByteOrder::LittleEndian)),
            Self::V3_BE => Ok((SyncWord::V3, ByteOrder::BigEndian)),
            Self::V3_LE => Ok((SyncWord::V3, ByteOrder::LittleEndian)),
            Self::APPLE_BE => Ok((SyncWord::Apple, ByteOrder::BigEndian)),
            Self::APPLE_LE => Ok((SyncWord::Apple, ByteOrder::LittleEndian)),
            other => Err(RasterError::BadSyncWord(other)),
        }
    }

    /// The 4 wire bytes for writing this dialect in the given byte order.
    pub fn encode(self, order: ByteOrder) -> [u8; 4] {
        let be = match self {
            SyncWord::V1 => Self::V1_BE,
            SyncWord::V2 => Self::V2_BE,
            SyncWord::V3 => Self::V3_BE,
            SyncWord::Apple => Self::APPLE_BE,
        };
        match order {
            ByteOrder::BigEndian => be.to_be_bytes(),
            ByteOrder::LittleEndian => be.swap_bytes().to_be_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pwg_sync_word() {
        let (word, order) = SyncWord::decode(SyncWord::V2_BE).unwrap();
        assert_eq!(word, SyncWord::V2);
        assert_eq!(order, ByteOrder::BigEndian);
    }

    #[test]
    fn decodes_reversed_v3_as_little_endian() {
        let (word, order) = SyncWord::decode(SyncWord::V3_LE).unwrap();
        assert_eq!(word, SyncWord::V3);
        assert_eq!(order, ByteOrder::LittleEndian);
    }

    #[test]
    fn rejects_unknown_sync_word() {
        assert!(SyncWord::decode(0xDEAD_BEEF).is_err());
    }

    #[test]
    fn round_trips_encode_decode() {
        for (word, order) in [
            (SyncWord::V1, ByteOrder::BigEndian),
            (SyncWord::V2, ByteOrder::LittleEndian),
            (SyncWord::V3, ByteOrder::BigEndian),
            (SyncWord::Apple, ByteOrder::LittleEndian),
        ] {
            let bytes = word.encode(order);
            let raw_be = u32::from_be_bytes(bytes);
            let (decoded_word, decoded_order) = SyncWord::decode(raw_be).unwrap();
            assert_eq!(decoded_word, word);
            assert_eq!(decoded_order, order);
        }
    }
}
