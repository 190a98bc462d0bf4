//! Contains the per-layer description that compressors are configured with.

use crate::meta::attribute::*;
use crate::compression::{Compression, config};
use crate::math::Vec2;
use crate::error::{Error, Result, UnitResult};


/// Describes a single layer of pixel data, as far as compression is concerned.
/// Built by the file-level caller from the header attributes of a file.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {

    /// List of channels in this layer, in the order their samples appear in a block.
    pub channels: ChannelList,

    /// How the pixel data of all channels in this layer is compressed.
    pub compression: Compression,

    /// The rectangle that positions this layer within the infinite 2D space.
    pub data_window: IntegerBounds,

    /// Whether this layer is divided into scan line blocks or tiles.
    pub blocks: BlockDescription,

    /// Whether this layer contains deep data, with a variable number of samples per pixel.
    pub deep: bool,

    /// The `zstdCompressionLevel` attribute of the file, between 1 and 9.
    /// Takes precedence over `config::default_zstd_compression_level()` when present.
    pub zstd_compression_level: Option<u8>,
}

/// How the pixel data of a layer is split into blocks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockDescription {

    /// Blocks of `Compression::scan_lines_per_block` full-width rows.
    ScanLines,

    /// Rectangular tiles of the specified size.
    Tiles(Vec2<usize>),
}


impl Header {

    /// Create a flat scan line layer description with the default compression level.
    pub fn new(channels: ChannelList, data_window: IntegerBounds, compression: Compression) -> Self {
        Header {
            channels, compression, data_window,
            blocks: BlockDescription::ScanLines,
            deep: false,
            zstd_compression_level: None,
        }
    }

    /// Divide this layer into tiles instead of scan line blocks.
    pub fn with_tiles(self, tile_size: impl Into<Vec2<usize>>) -> Self {
        Header { blocks: BlockDescription::Tiles(tile_size.into()), ..self }
    }

    /// Mark this layer as containing deep data.
    pub fn with_deep_data(self) -> Self {
        Header { deep: true, ..self }
    }

    /// Set the `zstdCompressionLevel` attribute of this layer.
    pub fn with_zstd_compression_level(self, level: u8) -> Self {
        Header { zstd_compression_level: Some(level), ..self }
    }

    /// The zstd compression level in effect for this layer:
    /// the header attribute if present, the process default otherwise.
    pub fn zstd_level(&self) -> u8 {
        self.zstd_compression_level.unwrap_or_else(config::default_zstd_compression_level)
    }

    /// The maximum pixel size of a single block of this layer.
    pub fn max_block_pixel_size(&self) -> Vec2<usize> {
        match self.blocks {
            BlockDescription::ScanLines => Vec2(
                self.data_window.size.width(),
                self.compression.scan_lines_per_block(),
            ),

            BlockDescription::Tiles(tile_size) => tile_size,
        }
    }

    /// The maximum number of uncompressed bytes a single block of this layer contains.
    pub fn max_block_byte_size(&self) -> Result<usize> {
        let size = self.max_block_pixel_size();
        self.channels.byte_size_of(IntegerBounds::new(self.data_window.position, size))
    }

    /// Check that compressors can be built for this layer.
    pub fn validate(&self) -> UnitResult {
        self.data_window.validate(None)?;

        let allow_sampling = !self.deep && self.blocks == BlockDescription::ScanLines;
        self.channels.validate(allow_sampling, self.data_window)?;

        if let BlockDescription::Tiles(size) = self.blocks {
            if size.area() == 0 {
                return Err(Error::configuration("tile size must not be zero"));
            }
        }

        if self.deep && !self.compression.supports_deep_data() {
            return Err(Error::configuration(format!(
                "{} does not support deep data", self.compression
            )));
        }

        if let Some(level) = self.zstd_compression_level {
            config::validate_zstd_compression_level(i32::from(level))?;
        }

        if let Compression::DWAA(Some(quality)) | Compression::DWAB(Some(quality)) = self.compression {
            config::validate_dwa_compression_level(quality)?;
        }

        Ok(())
    }
}
