//! Visitor identity derived from edge-network request metadata
//!
//! The edge forwards the viewer address, user agent, country and device
//! hints as request headers. This module turns them into the dimensions a
//! visit is counted under and a pseudonymous fingerprint used for
//! deduplication.

pub mod fingerprint;
pub mod metadata;

pub use fingerprint::Fingerprint;
pub use metadata::{DeviceClass, VisitorMetadata};
