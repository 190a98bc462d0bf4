//! Compresses and decompresses the pixel blocks of OpenEXR images,
//! including deep data with a variable number of samples per pixel.
//!
//! Reading and writing the surrounding file structure is not part of this crate.
//! The caller supplies the layer description as a `meta::Header`,
//! and the raw or compressed bytes of each block.
//!
//! Flat blocks are handled by `compression::Compressor`,
//! deep blocks by `compression::deep::DeepCompressor`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]


pub mod io;
pub mod math;
pub mod compression;
pub mod meta;
pub mod error;

#[cfg_attr(test, macro_use)]
extern crate smallvec;


/// Export the most important items from `exr_codecs`.
/// _Note: This includes a type called `Result`, possibly overwriting the default `std::Result` type usage._
pub mod prelude {

    // main exports
    pub use crate::compression::{Compression, Compressor, ByteVec, Bytes};
    pub use crate::compression::deep::{DeepCompressor, DeepSamples};
    pub use crate::compression::parallel::{compress_blocks, uncompress_blocks, ScanLineBlock};
    pub use crate::compression::registry::{CodecDescriptor, lookup_by_id, lookup_by_name};

    // secondary data types
    pub use crate::meta::Header;
    pub use crate::meta::attribute::{ChannelList, ChannelDescription, SampleType, IntegerBounds, Text};
    pub use crate::math::Vec2;
    pub use crate::error::{Result, Error};
    pub use crate::compression;
    pub use crate::meta;
    pub use crate::error;

    // re-export external stuff
    pub use half::f16;
    pub use smallvec::SmallVec;
}
