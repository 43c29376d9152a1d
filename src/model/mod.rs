//! Conversion request and result types.
//!
//! Both are plain values created per call; nothing here is shared between
//! conversions.

mod options;
mod result;

pub use options::*;
pub use result::*;
