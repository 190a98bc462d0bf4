//! Contains the compression attribute definition
//! and methods to compress and decompress blocks of pixel data.

pub mod registry;
pub mod config;
pub mod chunk;
pub mod deep;
pub mod parallel;
pub mod pipeline;

// private modules make non-breaking changes easier
mod zip;
mod rle;
mod pxr24;
mod zstd;


use std::str::FromStr;
use std::convert::TryFrom;
use log::{debug, trace};

use crate::meta::attribute::{IntegerBounds, SampleType, ChannelList};
use crate::meta::header::Header;
use crate::math::{Vec2, mod_p};
use crate::error::{Result, Error, i32_to_usize};
use self::registry::CodecDescriptor;


/// A byte vector.
pub type ByteVec = Vec<u8>;

/// A byte slice.
pub type Bytes<'s> = &'s [u8];

/// Specifies which compression method to use.
/// Use uncompressed data for fastest loading and writing speeds.
/// Use RLE compression for fast loading and writing with slight memory savings.
/// Use ZIP or ZSTD compression for slow processing with large memory savings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Compression {

    /// Store uncompressed values.
    /// Produces large files that can be read and written very quickly.
    /// Consider using RLE instead, as it provides some compression with almost equivalent speed.
    Uncompressed,

    /// Produces slightly smaller files
    /// that can still be read and written rather quickly.
    /// Works best for images with large flat areas, such as masks and abstract graphics.
    /// This compression method is lossless.
    RLE,

    /// Uses ZIP compression to compress each line. Slowly produces small images
    /// which can be read with moderate speed. This compression method is lossless.
    /// Might be slightly faster but larger than `ZIP16´.
    ZIP1,

    /// Uses ZIP compression to compress blocks of 16 lines. Slowly produces small images
    /// which can be read with moderate speed. This compression method is lossless.
    /// Might be slightly slower but smaller than `ZIP1´.
    ZIP16,

    /// __This compression method is registered, but not supported by this implementation.__
    // wavelet transform followed by huffman coding, in blocks of 32 scan lines
    PIZ,

    /// Like `ZIP16`, but reduces precision of `f32` images to `f24`.
    /// Therefore, this is lossless compression for `f16` and `u32` data, lossy compression for `f32` data.
    /// Works well for depth buffers and similar images,
    /// where full 32-bit floating-point accuracy is not necessary.
    PXR24,

    /// __This compression method is registered, but not supported by this implementation.__
    // lossy 4-by-4 pixel block compression with a fixed rate
    B44,

    /// __This compression method is registered, but not supported by this implementation.__
    // like b44, but flat fields are compressed more
    B44A,

    /// __This lossy compression is not supported by this implementation.__
    /// Contains the DWA quality, if one was specified.
    // lossy DCT based compression, in blocks of 32 scanlines.
    DWAA(Option<f32>),

    /// __This lossy compression is not supported by this implementation.__
    /// Contains the DWA quality, if one was specified.
    // lossy DCT based compression, in blocks of 256 scanlines.
    DWAB(Option<f32>),

    /// Uses the zstandard entropy coder on blocks of 32 lines.
    /// The bytes of each sample are shuffled before compression,
    /// so that equal bytes of neighbouring samples end up next to each other.
    /// This compression method is lossless for flat images.
    /// It is also the only entropy coder available for deep data,
    /// see `deep::DeepCompressor`.
    ZSTD,
}

impl std::fmt::Display for Compression {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} compression", match self {
            Compression::Uncompressed => "no",
            Compression::RLE => "rle",
            Compression::ZIP1 => "zip line",
            Compression::ZIP16 => "zip block",
            Compression::B44 => "b44",
            Compression::B44A => "b44a",
            Compression::DWAA(_) => "dwaa",
            Compression::DWAB(_) => "dwab",
            Compression::PIZ => "piz",
            Compression::PXR24 => "pxr24",
            Compression::ZSTD => "zstd",
        })
    }
}

impl FromStr for Compression {
    type Err = Error;

    /// Parse a codec name such as `zip` or `zstd`, ignoring case.
    fn from_str(name: &str) -> Result<Self> {
        let descriptor = registry::lookup_by_name(name).ok_or_else(|| Error::configuration(format!(
            "unknown compression method \"{}\" (expected one of {})",
            name, registry::all_names(", ")
        )))?;

        Compression::from_id(descriptor.id)
    }
}


impl Compression {

    /// The integer that identifies this compression method in a file header.
    pub fn id(self) -> u8 {
        use self::Compression::*;
        match self {
            Uncompressed => 0,
            RLE => 1,
            ZIP1 => 2,
            ZIP16 => 3,
            PIZ => 4,
            PXR24 => 5,
            B44 => 6,
            B44A => 7,
            DWAA(_) => 8,
            DWAB(_) => 9,
            ZSTD => 10,
        }
    }

    /// Look up the compression method for an integer from a file header.
    /// DWA methods are created without a quality.
    pub fn from_id(id: u8) -> Result<Self> {
        use self::Compression::*;
        Ok(match id {
            0 => Uncompressed,
            1 => RLE,
            2 => ZIP1,
            3 => ZIP16,
            4 => PIZ,
            5 => PXR24,
            6 => B44,
            7 => B44A,
            8 => DWAA(None),
            9 => DWAB(None),
            10 => ZSTD,
            _ => return Err(Error::configuration(format!("unknown compression method id {}", id))),
        })
    }

    /// The registry entry of this compression method.
    pub fn descriptor(self) -> &'static CodecDescriptor {
        &registry::CODECS[usize::from(self.id())]
    }

    /// For scan line images and deep scan line images, one or more scan lines may be
    /// stored together as a scan line block. The number of scan lines per block
    /// depends on how the pixel data are compressed.
    pub fn scan_lines_per_block(self) -> usize {
        self.descriptor().scan_lines
    }

    /// Deep data can only be compressed without compression, using RLE, line-wise ZIP, or ZSTD.
    /// Only ZSTD is implemented by `deep::DeepCompressor`.
    pub fn supports_deep_data(self) -> bool {
        self.descriptor().deep
    }

    /// Most compression methods will reconstruct the exact pixel bytes,
    /// but some might throw away unimportant data in some cases.
    pub fn may_loose_data(self) -> bool {
        self.descriptor().lossy
    }

    /// Most compression methods will reconstruct the exact pixel bytes of flat images,
    /// but some might throw away unimportant data for specific types of samples.
    pub fn is_lossless_for(self, sample_type: SampleType) -> bool {
        use self::Compression::*;
        match self {
            PXR24 => sample_type != SampleType::F32, // pxr reduces f32 to f24
            B44 | B44A => sample_type != SampleType::F16, // b44 only compresses f16 values, others are left uncompressed
            Uncompressed | RLE | ZIP1 | ZIP16 | PIZ | ZSTD => true,
            DWAB(_) | DWAA(_) => false,
        }
    }

    fn unsupported_error(self) -> Error {
        Error::unsupported(format!("{} is not implemented", self))
    }
}


/// Compresses and decompresses flat blocks of a single layer.
/// Blocks are either scan line blocks, identified by their first row,
/// or tiles, identified by their pixel rectangle.
///
/// All samples in a block are expected in little-endian byte order,
/// row by row, and within each row channel by channel, just like in the file.
///
/// The compressor owns the bytes it returns.
/// They stay valid until the next call on the same instance.
/// Use one instance per thread for concurrent compression,
/// see `parallel::compress_blocks`.
#[derive(Debug, Clone)]
pub struct Compressor {
    method: Compression,
    channels: ChannelList,
    data_window: IntegerBounds,
    max_block_size: Vec2<usize>,
    scan_lines: usize,

    zip_level: u8,
    zstd_level: u8,
    dwa_quality: f32,

    scratch: ByteVec,
    output: ByteVec,
}

impl Compressor {

    /// Create a compressor for the flat layer described by the header.
    /// Reads the current default levels once. Changing the defaults later does not affect this instance.
    pub fn new(header: &Header) -> Result<Self> {
        header.validate()?;

        if header.deep {
            return Err(Error::configuration("deep data requires a deep compressor"));
        }

        let dwa_quality = match header.compression {
            Compression::DWAA(Some(quality)) | Compression::DWAB(Some(quality)) => quality,
            _ => config::default_dwa_compression_level(),
        };

        Ok(Compressor {
            method: header.compression,
            channels: header.channels.clone(),
            data_window: header.data_window,
            max_block_size: header.max_block_pixel_size(),
            scan_lines: header.compression.scan_lines_per_block(),

            zip_level: config::default_zip_compression_level(),
            zstd_level: header.zstd_level(),
            dwa_quality,

            scratch: ByteVec::new(),
            output: ByteVec::new(),
        })
    }

    /// The compression method of this instance.
    pub fn compression(&self) -> Compression { self.method }

    /// The number of scan lines in a full block.
    /// The last block of a layer may contain fewer lines.
    pub fn num_scan_lines(&self) -> usize { self.scan_lines }

    /// The zip level this instance was created with.
    pub fn zip_level(&self) -> u8 { self.zip_level }

    /// The zstd level this instance was created with.
    pub fn zstd_level(&self) -> u8 { self.zstd_level }

    /// The DWA quality this instance was created with.
    pub fn dwa_quality(&self) -> f32 { self.dwa_quality }

    /// Compress the scan line block that starts at the specified row of the data window.
    /// Returns the raw bytes if compression would not make the block smaller.
    pub fn compress(&mut self, uncompressed: Bytes<'_>, origin_y: i32) -> Result<Bytes<'_>> {
        let bounds = self.scan_line_block_bounds(origin_y)?;
        self.compress_section(uncompressed, bounds)
    }

    /// Decompress the scan line block that starts at the specified row of the data window.
    pub fn uncompress(&mut self, compressed: Bytes<'_>, origin_y: i32) -> Result<Bytes<'_>> {
        let bounds = self.scan_line_block_bounds(origin_y)?;
        self.uncompress_section(compressed, bounds)
    }

    /// Compress the tile that covers the specified pixel rectangle.
    /// Returns the raw bytes if compression would not make the tile smaller.
    pub fn compress_tile(&mut self, uncompressed: Bytes<'_>, bounds: IntegerBounds) -> Result<Bytes<'_>> {
        self.validate_tile_bounds(bounds)?;
        self.compress_section(uncompressed, bounds)
    }

    /// Decompress the tile that covers the specified pixel rectangle.
    pub fn uncompress_tile(&mut self, compressed: Bytes<'_>, bounds: IntegerBounds) -> Result<Bytes<'_>> {
        self.validate_tile_bounds(bounds)?;
        self.uncompress_section(compressed, bounds)
    }

    /// Release the memory of the retained buffers.
    /// Bytes returned earlier are borrowed from this instance,
    /// so they cannot be in use anymore when this is called.
    pub fn clear(&mut self) {
        self.output = ByteVec::new();
        self.scratch = ByteVec::new();
    }

    fn scan_line_block_bounds(&self, origin_y: i32) -> Result<IntegerBounds> {
        let window_start = self.data_window.position.y();
        let window_end = self.data_window.end()?.y();

        if origin_y < window_start || origin_y >= window_end {
            return Err(Error::invalid(format!("block origin y = {} outside of the data window", origin_y)));
        }

        let offset = origin_y - window_start;
        let block_height = i32::try_from(self.scan_lines)
            .map_err(|_| Error::invalid("scan line count"))?;

        if mod_p(offset, block_height) != 0 {
            return Err(Error::invalid(format!(
                "block origin y = {} is not aligned to blocks of {} scan lines",
                origin_y, self.scan_lines
            )));
        }

        let height = i32_to_usize(window_end - origin_y, "block height")?.min(self.scan_lines);
        Ok(IntegerBounds::new(
            Vec2(self.data_window.position.x(), origin_y),
            Vec2(self.data_window.size.width(), height)
        ))
    }

    fn validate_tile_bounds(&self, bounds: IntegerBounds) -> Result<()> {
        bounds.validate(Some(self.max_block_size))?;

        if !self.data_window.contains(bounds)? {
            return Err(Error::invalid("tile outside of the data window"));
        }

        Ok(())
    }

    fn expected_byte_size(&self, uncompressed: Bytes<'_>, bounds: IntegerBounds) -> Result<usize> {
        let expected_byte_size = self.channels.byte_size_of(bounds)?;

        if uncompressed.len() != expected_byte_size {
            return Err(Error::capacity(format!(
                "block of {} bytes does not match the {} bytes of its pixel rectangle",
                uncompressed.len(), expected_byte_size
            )));
        }

        Ok(expected_byte_size)
    }

    fn compress_section(&mut self, uncompressed: Bytes<'_>, bounds: IntegerBounds) -> Result<Bytes<'_>> {
        self.expected_byte_size(uncompressed, bounds)?;

        use self::Compression::*;
        let compressed = match self.method {
            Uncompressed => None,
            RLE => Some(rle::compress_bytes(uncompressed, &mut self.scratch)),
            ZIP1 | ZIP16 => Some(zip::compress_bytes(uncompressed, self.zip_level, &mut self.scratch)),
            PXR24 => Some(pxr24::compress(&self.channels, uncompressed, bounds, self.zip_level)?),
            ZSTD => Some(zstd::compress(&self.channels, uncompressed, self.zstd_level)?),
            PIZ | B44 | B44A | DWAA(_) | DWAB(_) => return Err(self.method.unsupported_error()),
        };

        match compressed {
            // only use compressed bytes if they actually are smaller than raw
            Some(compressed) if compressed.len() < uncompressed.len() => {
                trace!("compressed {} bytes to {} bytes using {}", uncompressed.len(), compressed.len(), self.method);
                self.output = compressed;
            },

            compressed => {
                if compressed.is_some() {
                    debug!("{} did not shrink a block of {} bytes, storing it raw", self.method, uncompressed.len());
                }

                self.output.clear();
                self.output.extend_from_slice(uncompressed);
            },
        }

        Ok(&self.output)
    }

    fn uncompress_section(&mut self, compressed: Bytes<'_>, bounds: IntegerBounds) -> Result<Bytes<'_>> {
        let expected_byte_size = self.channels.byte_size_of(bounds)?;

        use self::Compression::*;
        if let PIZ | B44 | B44A | DWAA(_) | DWAB(_) = self.method {
            return Err(self.method.unsupported_error());
        }

        // note: always true where self == Uncompressed
        if compressed.len() == expected_byte_size {
            // the compressed data was larger than the raw data, so the small raw data has been written
            self.output.clear();
            self.output.extend_from_slice(compressed);
            return Ok(&self.output);
        }

        let decompressed = match self.method {
            RLE => rle::decompress_bytes(compressed, expected_byte_size)?,
            ZIP1 | ZIP16 => zip::decompress_bytes(compressed, expected_byte_size)?,
            PXR24 => pxr24::decompress(&self.channels, compressed, bounds, expected_byte_size)?,
            ZSTD => zstd::decompress(compressed, expected_byte_size)?,

            _ => return Err(Error::invalid(format!(
                "block of {} bytes does not match the {} bytes of its pixel rectangle",
                compressed.len(), expected_byte_size
            ))),
        };

        if decompressed.len() != expected_byte_size {
            return Err(Error::invalid(format!("decompressed {} data", self.method)));
        }

        trace!("decompressed {} bytes to {} bytes using {}", compressed.len(), decompressed.len(), self.method);
        self.output = decompressed;
        Ok(&self.output)
    }
}


/// A collection of functions used to prepare data for compression.
mod optimize_bytes {

    /// Integrate over all differences to the previous value in order to reconstruct sample values.
    pub fn differences_to_samples(buffer: &mut [u8]) {
        if let Some((first, rest)) = buffer.split_first_mut() {
            let mut previous = *first as i16;

            // processing pairs lets the two additions of a pair run in parallel
            let mut pairs = rest.chunks_exact_mut(2);
            for pair in &mut pairs {
                let sample0 = (previous + pair[0] as i16 - 128) as u8;
                let sample1 = (sample0 as i16 + pair[1] as i16 - 128) as u8;
                pair[0] = sample0;
                pair[1] = sample1;
                previous = sample1 as i16;
            }

            for last in pairs.into_remainder() {
                *last = (previous + *last as i16 - 128) as u8;
            }
        }
    }

    /// Derive over all values in order to produce differences to the previous value.
    pub fn samples_to_differences(buffer: &mut [u8]) {
        for index in (1..buffer.len()).rev() {
            buffer[index] = buffer[index].wrapping_sub(buffer[index - 1]).wrapping_add(128);
        }
    }

    /// Interleave the bytes such that the second half of the array is each other byte.
    pub fn interleave_byte_blocks(separated: &mut [u8]) {
        let (first_half, second_half) = separated.split_at((separated.len() + 1) / 2);
        let mut interleaved = Vec::with_capacity(separated.len());

        for (index, &byte) in first_half.iter().enumerate() {
            interleaved.push(byte);
            interleaved.extend(second_half.get(index));
        }

        separated.copy_from_slice(&interleaved);
    }

    /// Separate the bytes such that the second half contains each other byte.
    pub fn separate_bytes_fragments(source: &mut [u8]) {
        let even = source.iter().step_by(2);
        let odd = source.iter().skip(1).step_by(2);
        let separated: Vec<u8> = even.chain(odd).copied().collect();
        source.copy_from_slice(&separated);
    }


}
