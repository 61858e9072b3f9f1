//! Binary artifact for compiled tables.
//!
//! Layout: a 16-byte header followed by the postcard-encoded table.
//!
//! | Offset | Size | Field                       |
//! |--------|------|-----------------------------|
//! | 0      | 4    | magic `CNPY`                |
//! | 4      | 2    | format version              |
//! | 6      | 2    | reserved                    |
//! | 8      | 4    | payload length              |
//! | 12     | 4    | CRC32 of the payload        |

use crate::table::GrammarTable;

pub const MAGIC: [u8; 4] = *b"CNPY";
pub const VERSION: u16 = 1;
pub const HEADER_SIZE: usize = 16;

/// Artifact load error.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("invalid magic: expected CNPY")]
    InvalidMagic,
    #[error("unsupported version: {0} (expected {VERSION})")]
    UnsupportedVersion(u16),
    #[error("file too small: {0} bytes (minimum {HEADER_SIZE})")]
    FileTooSmall(usize),
    #[error("size mismatch: header says {header} bytes, got {actual}")]
    SizeMismatch { header: u32, actual: usize },
    #[error("checksum mismatch: header says {header:#010x}, payload hashes to {actual:#010x}")]
    ChecksumMismatch { header: u32, actual: u32 },
    #[error("invalid payload: {0}")]
    Payload(#[from] postcard::Error),
}

#[inline]
fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

#[inline]
fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Header {
    magic: [u8; 4],
    version: u16,
    payload_len: u32,
    checksum: u32,
}

impl Header {
    fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: read_u16_le(bytes, 4),
            payload_len: read_u32_le(bytes, 8),
            checksum: read_u32_le(bytes, 12),
        }
    }

    fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }
}

impl GrammarTable {
    pub fn to_artifact(&self) -> Result<Vec<u8>, ArtifactError> {
        let payload = postcard::to_allocvec(self)?;
        let header = Header {
            magic: MAGIC,
            version: VERSION,
            payload_len: payload.len() as u32,
            checksum: crc32fast::hash(&payload),
        };

        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    pub fn from_artifact(bytes: &[u8]) -> Result<Self, ArtifactError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ArtifactError::FileTooSmall(bytes.len()));
        }

        let header = Header::from_bytes(&bytes[..HEADER_SIZE]);
        if header.magic != MAGIC {
            return Err(ArtifactError::InvalidMagic);
        }
        if header.version != VERSION {
            return Err(ArtifactError::UnsupportedVersion(header.version));
        }

        let payload = &bytes[HEADER_SIZE..];
        if header.payload_len as usize != payload.len() {
            return Err(ArtifactError::SizeMismatch {
                header: header.payload_len,
                actual: payload.len(),
            });
        }
        let actual = crc32fast::hash(payload);
        if actual != header.checksum {
            return Err(ArtifactError::ChecksumMismatch {
                header: header.checksum,
                actual,
            });
        }

        Ok(postcard::from_bytes(payload)?)
    }
}
