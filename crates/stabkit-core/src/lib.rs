//! StabKit Core - Foundation types for video stabilization
//!
//! This crate provides the fundamental types used throughout StabKit:
//! - Error taxonomy (`StabError`)
//! - Frame buffers and pixel formats
//! - The `Homography` projective transform

pub mod error;
pub mod frame;
pub mod geometry;

pub use error::{Result, StabError};
pub use frame::{FrameBuffer, FramePlane, PixelFormat};
pub use geometry::Homography;
