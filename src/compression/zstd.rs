//! Lossless zstandard compression of flat blocks.
//! Every block becomes a single chunk, see `chunk::CompressedChunk`.

use super::*;
use super::chunk::{CompressedChunk, ChunkParameters, decode_chunk};


/// Samples are shuffled by the size of the channel type,
/// or by four bytes if the channels have different types.
fn parameters_for(channels: &ChannelList, level: u8) -> ChunkParameters {
    let type_size = channels.uniform_sample_type
        .map_or(4, |sample_type| sample_type.bytes_per_sample());

    ChunkParameters::shuffle(type_size, level)
}

pub fn compress(channels: &ChannelList, uncompressed: Bytes<'_>, level: u8) -> Result<ByteVec> {
    let chunk = CompressedChunk::encode(uncompressed, parameters_for(channels, level))?;
    Ok(chunk.into_bytes())
}

pub fn decompress(compressed: Bytes<'_>, expected_byte_size: usize) -> Result<ByteVec> {
    decode_chunk(compressed, expected_byte_size)
}
