//! The persistent identifier index and its log format.

mod engine;
mod frame;

pub use engine::{PersistentIndex, INDEX_VERSION, LOG_HEADER_SIZE, LOG_MAGIC};
pub use frame::{frame_follows, read_frame, FrameKind, FrameRead, LogFrame};
