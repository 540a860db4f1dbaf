//! Wire contract for the pragmatic_segmenter HTTP server.
//!
//! The server exposes a single `POST /segment` endpoint. Both the runtime's
//! readiness probe and the segment client speak this contract, so the types
//! live here rather than in either adapter. Keep this crate free of I/O and
//! framework types to avoid dependency creep.

pub mod segment;

pub use segment::{SegmentRequest, Segmentation, segment_url};
