//! Processors module - per-file transform logic
//!
//! This module contains the following submodules:
//! - `file`: Output bookkeeping (resume check, partial writes, timestamp-preserving copy)
//! - `image`: Photo copy and JPEG shrinking
//! - `video`: Video transcoding through ffmpeg
//! - `setup`: Initialization setup (logger, output folder)

pub mod file;
pub mod image;
pub mod setup;
pub mod video;
