//! Thin HTTP client for the pragmatic_segmenter server.
//!
//! Wraps `POST /segment` in a typed call: build a
//! [`SegmentRequest`](pseg_core::SegmentRequest), get back
//! [`Segmentation`](pseg_core::Segmentation)s in input order. Failures are
//! surfaced as [`ClientError`] variants so callers can tell a dead server
//! from a misbehaving one instead of receiving an empty result.

pub mod client;
pub mod error;

pub use client::SegmenterClient;
pub use error::{ClientError, ClientResult};
