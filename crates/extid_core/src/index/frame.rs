//! Log frames.
//!
//! ```text
//! | kind (1) | payload length (u32 LE) | payload | crc32 (u32 LE) |
//! ```
//!
//! The CRC covers kind, length and payload.
//!
//! Payloads:
//!
//! ```text
//! FileIndexed: | path (text) | sha256 (32) | count (u32 LE) | (key (text) | value)* |
//! FileRemoved: | path (text) |
//! ```

use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use extid_codec::{crc32, CodecResult, DataReader, DataWriter, Encode};

/// Size of kind plus payload length.
pub const FRAME_HEADER_SIZE: usize = 5;
/// Size of the trailing CRC.
pub const FRAME_CRC_SIZE: usize = 4;

/// Kind byte of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    /// A file's full set of entries.
    FileIndexed = 1,
    /// A file was dropped from the index.
    FileRemoved = 2,
}

impl FrameKind {
    /// Converts a byte to a frame kind.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::FileIndexed),
            2 => Some(Self::FileRemoved),
            _ => None,
        }
    }

    /// Converts the frame kind to a byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// One logical log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFrame {
    /// Replaces everything known about `path`.
    FileIndexed {
        /// Source file path.
        path: String,
        /// SHA-256 of the content the entries were extracted from.
        hash: [u8; 32],
        /// Detached records, one per key.
        entries: Vec<Record>,
    },
    /// Drops everything known about `path`.
    FileRemoved {
        /// Source file path.
        path: String,
    },
}

impl LogFrame {
    /// Returns the frame kind.
    #[must_use]
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::FileIndexed { .. } => FrameKind::FileIndexed,
            Self::FileRemoved { .. } => FrameKind::FileRemoved,
        }
    }

    /// Returns the source file path.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::FileIndexed { path, .. } | Self::FileRemoved { path } => path,
        }
    }

    /// Encodes the complete frame, envelope and CRC included.
    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        let payload = self.encode()?;
        let len = u32::try_from(payload.len()).map_err(|_| {
            CoreError::invalid_format(format!("frame payload too large: {} bytes", payload.len()))
        })?;

        let mut out =
            DataWriter::with_capacity(FRAME_HEADER_SIZE + payload.len() + FRAME_CRC_SIZE);
        out.write_u8(self.kind().as_byte());
        out.write_u32(len);
        out.write_raw(&payload);
        let mut bytes = out.into_bytes();
        let crc = crc32(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        Ok(bytes)
    }

    /// Decodes a payload of the given kind.
    pub fn decode_payload(kind: FrameKind, payload: &[u8]) -> CodecResult<Self> {
        let mut input = DataReader::new(payload);
        let path = input.read_text()?;
        let frame = match kind {
            FrameKind::FileIndexed => {
                let hash = input.read_array::<32>()?;
                let count = input.read_count()?;
                let mut entries = Vec::with_capacity(count.min(4096));
                for _ in 0..count {
                    let key = input.read_text()?;
                    entries.push(Record::read_value(key, &mut input)?);
                }
                Self::FileIndexed {
                    path,
                    hash,
                    entries,
                }
            }
            FrameKind::FileRemoved => Self::FileRemoved { path },
        };
        input.finish()?;
        Ok(frame)
    }
}

impl Encode for LogFrame {
    fn encode_to(&self, out: &mut DataWriter) -> CodecResult<()> {
        out.write_text(self.path())?;
        if let Self::FileIndexed { hash, entries, .. } = self {
            out.write_raw(hash);
            out.write_count(entries.len())?;
            for record in entries {
                out.write_text(record.id())?;
                record.write_value(out)?;
            }
        }
        Ok(())
    }
}

/// Outcome of reading the frame that starts at some offset.
#[derive(Debug)]
pub enum FrameRead {
    /// A valid frame and its total size in bytes.
    Complete(LogFrame, usize),
    /// The log ends inside this frame.
    Torn,
    /// The frame is present but invalid.
    Corrupt(String),
}

/// Reads the frame at the start of `bytes`.
pub fn read_frame(bytes: &[u8]) -> FrameRead {
    if bytes.len() < FRAME_HEADER_SIZE {
        return FrameRead::Torn;
    }
    let Some(kind) = FrameKind::from_byte(bytes[0]) else {
        return FrameRead::Corrupt(format!("unknown frame kind {}", bytes[0]));
    };
    let len = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    let total = FRAME_HEADER_SIZE + len + FRAME_CRC_SIZE;
    if bytes.len() < total {
        return FrameRead::Torn;
    }

    let body_end = FRAME_HEADER_SIZE + len;
    let stored = u32::from_le_bytes([
        bytes[body_end],
        bytes[body_end + 1],
        bytes[body_end + 2],
        bytes[body_end + 3],
    ]);
    let computed = crc32(&bytes[..body_end]);
    if stored != computed {
        return FrameRead::Corrupt(format!(
            "crc mismatch: stored {stored:#010x}, computed {computed:#010x}"
        ));
    }

    match LogFrame::decode_payload(kind, &bytes[FRAME_HEADER_SIZE..body_end]) {
        Ok(frame) => FrameRead::Complete(frame, total),
        Err(e) => FrameRead::Corrupt(format!("undecodable payload: {e}")),
    }
}

/// Returns true if a complete, valid frame starts anywhere after the first
/// byte of `bytes`.
///
/// A short read whose bytes are followed by a valid frame is a damaged
/// length field, not a torn tail.
pub fn frame_follows(bytes: &[u8]) -> bool {
    (1..bytes.len()).any(|start| {
        let rest = &bytes[start..];
        rest.len() >= FRAME_HEADER_SIZE + FRAME_CRC_SIZE
            && FrameKind::from_byte(rest[0]).is_some()
            && matches!(read_frame(rest), FrameRead::Complete(..))
    })
}
