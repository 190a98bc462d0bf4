//! Describes the pixel layout that compressors operate on.
//! Parsing these values from a file is the job of the file-level caller.

pub mod attribute;
pub mod header;

pub use self::header::{Header, BlockDescription};
