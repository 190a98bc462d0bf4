//! Compression of deep data, where each pixel holds a variable number of samples.
//!
//! With zstd, the samples of each channel are compressed into a separate chunk,
//! using the chunk parameters that suit the channel type.
//! All chunks are then stored in an envelope:
//!
//! ```text
//! i32 version (always 0)
//! for each channel, in the order of the channel list:
//!     i32 chunk byte size
//!     chunk bytes
//! ```
//!
//! The envelope does not identify the channels.
//! The reader must use the same channel list as the writer.
//! Decoding with a reordered channel list fails if the moved channels
//! have different sample types, as each chunk header records the sample layout.
//! Reordering channels of the same type goes unnoticed and swaps their samples.
//!
//! Deep layers may also use `none`, `rle` or `zips`, the byte codecs of flat blocks.
//! These compress the sample data of all channels as a single buffer, without an envelope,
//! and store the buffer raw if compression would not make it smaller.
//! The sample count table is compressed the same way.

use std::ops::Range;
use log::trace;

use crate::compression::{ByteVec, Bytes, Compression, config, rle, zip};
use crate::compression::chunk::{CompressedChunk, ChunkParameters, ChunkAlgorithm, read_chunk_header, decode_chunk};
use crate::compression::parallel::map_in_parallel;
use crate::meta::attribute::{ChannelList, SampleType};
use crate::meta::header::Header;
use crate::io::Data;
use crate::error::{Error, Result, i32_to_usize};


/// The version tag at the start of each envelope.
pub const ENVELOPE_VERSION: i32 = 0;

/// The samples of one deep block.
#[derive(Debug, Clone, Copy)]
pub struct DeepSamples<'s> {

    /// All samples of the first channel, then all samples of the second channel, and so on.
    /// Each channel contributes `total sample count * bytes per sample` little-endian bytes.
    pub sample_data: Bytes<'s>,

    /// For each pixel, the total number of samples of this pixel and all pixels before it.
    /// The last entry is the total sample count of the block.
    pub pixel_offsets: &'s [i32],
}

/// Compresses deep blocks of a single layer.
///
/// The returned bytes are owned by the compressor.
/// They stay valid until the next call on the same instance,
/// which first discards them. Use `clear` to release the memory.
#[derive(Debug, Clone)]
pub struct DeepCompressor {
    method: Compression,
    channels: ChannelList,
    zip_level: u8,
    zstd_level: u8,
    scratch: ByteVec,
    output: ByteVec,
}

impl DeepCompressor {

    /// Create a compressor for the deep layer described by the header.
    /// Reads the zip and zstd compression levels once.
    pub fn new(header: &Header) -> Result<Self> {
        header.validate()?;

        if !header.deep {
            return Err(Error::configuration("flat data requires a flat compressor"));
        }

        match header.compression {
            Compression::Uncompressed | Compression::RLE | Compression::ZIP1 | Compression::ZSTD => {},
            other => return Err(Error::unsupported(format!("deep data with {}", other))),
        }

        Ok(DeepCompressor {
            method: header.compression,
            channels: header.channels.clone(),
            zip_level: config::default_zip_compression_level(),
            zstd_level: header.zstd_level(),
            scratch: ByteVec::new(),
            output: ByteVec::new(),
        })
    }

    /// The compression method of this instance.
    pub fn compression(&self) -> Compression { self.method }

    /// Deep blocks always contain a single scan line.
    pub fn num_scan_lines(&self) -> usize { 1 }

    /// The zstd level this instance was created with.
    pub fn zstd_level(&self) -> u8 { self.zstd_level }

    /// Compress the samples of all channels.
    /// Produces an envelope with one chunk per channel for zstd,
    /// and a single compressed buffer for the other methods.
    pub fn compress(&mut self, samples: DeepSamples<'_>) -> Result<Bytes<'_>> {
        self.output.clear();

        let total_sample_count = total_sample_count(samples.pixel_offsets)?;
        let ranges = channel_byte_ranges(&self.channels, total_sample_count, samples.sample_data.len())?;

        if self.method != Compression::ZSTD {
            self.output = compress_bytes(self.method, samples.sample_data, self.zip_level, &mut self.scratch);
            trace!("compressed {} deep sample bytes to {} bytes using {}", samples.sample_data.len(), self.output.len(), self.method);
            return Ok(&self.output);
        }

        let level = self.zstd_level;

        let chunks = map_in_parallel(ranges, |(sample_type, range)| {
            let parameters = ChunkParameters::for_sample_type(sample_type, level);
            CompressedChunk::encode(&samples.sample_data[range], parameters)
        });

        let chunks = chunks.into_iter().collect::<Result<Vec<_>>>()?;
        write_envelope(&mut self.output, &chunks)?;

        trace!(
            "compressed {} deep samples of {} bytes into an envelope of {} bytes",
            total_sample_count, samples.sample_data.len(), self.output.len()
        );

        Ok(&self.output)
    }

    /// Decompress the samples of all channels, returning them channel by channel.
    pub fn uncompress(&mut self, envelope: Bytes<'_>, pixel_offsets: &[i32]) -> Result<Bytes<'_>> {
        self.output.clear();

        let total_sample_count = total_sample_count(pixel_offsets)?;

        if self.method != Compression::ZSTD {
            let byte_size = total_sample_count.checked_mul(self.channels.bytes_per_pixel)
                .ok_or_else(|| Error::capacity("deep block byte size"))?;

            self.output = uncompress_bytes(self.method, envelope, byte_size)?;
            return Ok(&self.output);
        }

        let chunks = read_envelope(envelope, self.channels.list.len())?;

        let expected: Vec<(SampleType, usize, Bytes<'_>)> = self.channels.list.iter()
            .zip(chunks)
            .map(|(channel, chunk)| {
                let byte_size = total_sample_count.checked_mul(channel.sample_type.bytes_per_sample())
                    .ok_or_else(|| Error::capacity("deep channel byte size"))?;

                Ok((channel.sample_type, byte_size, chunk))
            })
            .collect::<Result<_>>()?;

        let decoded = map_in_parallel(expected, |(sample_type, byte_size, chunk)| {
            decode_channel_chunk(chunk, sample_type, byte_size)
        });

        let decoded = decoded.into_iter().collect::<Result<Vec<_>>>()?;
        for channel_bytes in decoded {
            self.output.extend_from_slice(&channel_bytes);
        }

        trace!("decompressed a deep envelope of {} bytes into {} bytes", envelope.len(), self.output.len());
        Ok(&self.output)
    }

    /// Compress the pixel offset table of a deep block.
    /// Produces an envelope with a single chunk for zstd.
    pub fn compress_sample_count_table(&mut self, pixel_offsets: &[i32]) -> Result<Bytes<'_>> {
        self.output.clear();
        total_sample_count(pixel_offsets)?;

        let mut table = ByteVec::with_capacity(pixel_offsets.len() * i32::BYTE_SIZE);
        i32::write_slice(&mut table, pixel_offsets)?;

        if self.method != Compression::ZSTD {
            self.output = compress_bytes(self.method, &table, self.zip_level, &mut self.scratch);
            return Ok(&self.output);
        }

        let parameters = ChunkParameters::for_sample_type(SampleType::U32, self.zstd_level);
        let chunk = CompressedChunk::encode(&table, parameters)?;
        write_envelope(&mut self.output, &[ chunk ])?;

        trace!("compressed a table of {} pixel offsets into {} bytes", pixel_offsets.len(), self.output.len());
        Ok(&self.output)
    }

    /// Decompress the pixel offset table of a deep block.
    /// Validates that the offsets do not decrease.
    pub fn uncompress_sample_count_table(&mut self, envelope: Bytes<'_>, pixel_count: usize) -> Result<Vec<i32>> {
        self.output.clear();

        let byte_size = pixel_count.checked_mul(i32::BYTE_SIZE)
            .ok_or_else(|| Error::capacity("pixel offset table byte size"))?;

        let table = {
            if self.method == Compression::ZSTD {
                let chunks = read_envelope(envelope, 1)?;
                decode_channel_chunk(chunks[0], SampleType::U32, byte_size)?
            }
            else {
                uncompress_bytes(self.method, envelope, byte_size)?
            }
        };

        let pixel_offsets = i32::read_vec(&mut table.as_slice(), pixel_count)?;

        total_sample_count(&pixel_offsets)?;
        Ok(pixel_offsets)
    }

    /// Release the memory of the retained envelope or samples.
    /// Bytes returned earlier are borrowed from this instance,
    /// so they cannot be in use anymore when this is called.
    pub fn clear(&mut self) {
        self.output = ByteVec::new();
        self.scratch = ByteVec::new();
    }
}


/// The total number of samples of a block, which is the last pixel offset.
/// Returns an error for negative or decreasing offsets.
pub fn total_sample_count(pixel_offsets: &[i32]) -> Result<usize> {
    let mut previous = 0;

    for &offset in pixel_offsets {
        if offset < previous {
            return Err(Error::invalid("deep pixel offsets must not decrease"));
        }

        previous = offset;
    }

    i32_to_usize(previous, "deep sample count")
}

/// Overhead of an envelope: the version tag and one size per channel.
pub fn envelope_overhead(channel_count: usize) -> usize {
    i32::BYTE_SIZE * (1 + channel_count)
}

/// The byte range of each channel in the sample data.
/// Fails before any compression if the ranges do not cover the sample data exactly.
fn channel_byte_ranges(channels: &ChannelList, total_sample_count: usize, sample_data_byte_size: usize) -> Result<Vec<(SampleType, Range<usize>)>> {
    let mut ranges = Vec::with_capacity(channels.list.len());
    let mut start: usize = 0;

    for channel in &channels.list {
        let end = total_sample_count.checked_mul(channel.sample_type.bytes_per_sample())
            .and_then(|byte_size| start.checked_add(byte_size))
            .ok_or_else(|| Error::capacity("deep channel byte range"))?;

        if end > sample_data_byte_size {
            return Err(Error::capacity(format!(
                "deep channel {} needs bytes up to {}, but the block has only {} bytes",
                channel.name, end, sample_data_byte_size
            )));
        }

        ranges.push((channel.sample_type, start .. end));
        start = end;
    }

    if start != sample_data_byte_size {
        return Err(Error::invalid(format!(
            "deep block has {} bytes, but its channels only contain {} bytes",
            sample_data_byte_size, start
        )));
    }

    Ok(ranges)
}

fn write_envelope(output: &mut ByteVec, chunks: &[CompressedChunk]) -> Result<()> {
    let byte_size = chunks.iter().map(CompressedChunk::len).sum::<usize>() + envelope_overhead(chunks.len());
    output.reserve(byte_size);

    ENVELOPE_VERSION.write(output)?;
    for chunk in chunks {
        u8::write_i32_sized_slice(output, chunk.as_bytes())?;
    }

    debug_assert_eq!(output.len(), byte_size, "envelope size bug");
    Ok(())
}

/// Split the envelope into one chunk per channel.
fn read_envelope(envelope: Bytes<'_>, channel_count: usize) -> Result<Vec<Bytes<'_>>> {
    let mut remaining = envelope;

    let version = i32::read(&mut remaining)?;
    if version != ENVELOPE_VERSION {
        return Err(Error::invalid(format!("unsupported deep envelope version {}", version)));
    }

    let mut chunks = Vec::with_capacity(channel_count);
    for _ in 0 .. channel_count {
        let byte_size = i32_to_usize(i32::read(&mut remaining)?, "deep chunk size")?;

        if byte_size > remaining.len() {
            return Err(Error::invalid("deep chunk size exceeds the envelope"));
        }

        let (chunk, rest) = remaining.split_at(byte_size);
        chunks.push(chunk);
        remaining = rest;
    }

    if !remaining.is_empty() {
        return Err(Error::invalid("trailing bytes after the last deep chunk"));
    }

    Ok(chunks)
}

/// Compress with one of the byte codecs that deep data shares with flat blocks.
/// Returns the raw bytes if compression would not make them smaller.
fn compress_bytes(method: Compression, bytes: Bytes<'_>, zip_level: u8, scratch: &mut ByteVec) -> ByteVec {
    let compressed = match method {
        Compression::RLE => Some(rle::compress_bytes(bytes, scratch)),
        Compression::ZIP1 => Some(zip::compress_bytes(bytes, zip_level, scratch)),
        _ => None,
    };

    match compressed {
        Some(compressed) if compressed.len() < bytes.len() => compressed,
        _ => bytes.to_vec(),
    }
}

/// Reverse `compress_bytes`. Raw buffers are detected by their length.
fn uncompress_bytes(method: Compression, compressed: Bytes<'_>, expected_byte_size: usize) -> Result<ByteVec> {
    if compressed.len() == expected_byte_size {
        return Ok(compressed.to_vec());
    }

    let decompressed = match method {
        Compression::RLE => rle::decompress_bytes(compressed, expected_byte_size)?,
        Compression::ZIP1 => zip::decompress_bytes(compressed, expected_byte_size)?,

        _ => return Err(Error::invalid(format!(
            "deep data of {} bytes does not match the expected {} bytes",
            compressed.len(), expected_byte_size
        ))),
    };

    if decompressed.len() != expected_byte_size {
        return Err(Error::invalid(format!("decompressed {} deep data", method)));
    }

    Ok(decompressed)
}

/// Decode a chunk after checking that it was written for this channel type.
fn decode_channel_chunk(chunk: Bytes<'_>, sample_type: SampleType, byte_size: usize) -> Result<ByteVec> {
    let header = read_chunk_header(chunk)?;

    if header.algorithm != ChunkAlgorithm::for_sample_type(sample_type)
        || header.type_size != sample_type.bytes_per_sample()
    {
        return Err(Error::invalid(format!("deep chunk was not written for a {} channel", sample_type)));
    }

    decode_chunk(chunk, byte_size)
}
