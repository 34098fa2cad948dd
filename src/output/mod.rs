//! Post-processing of helper output.
//!
//! Command output is free-form text; tools that print JSON often mix it
//! with log lines or banners. [`extract_json_blobs`] pulls the embedded
//! objects back out.

mod blobs;

pub use blobs::extract_json_blobs;
