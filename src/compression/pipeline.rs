//! Entry points for encode and decode pipelines that manage their own buffers.
//! The pipeline packs the samples of a chunk into one buffer,
//! and provides the buffer the compressed bytes must fit into.

use std::fmt;
use crate::compression::{Bytes, config};
use crate::compression::chunk::{CompressedChunk, ChunkParameters, decode_chunk};
use crate::error::Error;


/// The type size used to shuffle packed pipeline buffers.
pub const PIPELINE_TYPE_SIZE: usize = 2;

/// The ways a pipeline step can fail.
#[derive(Debug)]
pub enum PipelineError {

    /// Compression failed, or the result does not fit into the provided buffer.
    /// The pipeline cannot provide a larger buffer.
    Unknown(Error),

    /// The compressed bytes do not decompress to the expected byte count.
    CorruptChunk(Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Unknown(error) => write!(formatter, "pipeline step failed: {}", error),
            PipelineError::CorruptChunk(error) => write!(formatter, "corrupt chunk: {}", error),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Unknown(error) | PipelineError::CorruptChunk(error) => Some(error),
        }
    }
}


/// Compress the packed buffer into the start of the compressed buffer.
/// Uses the level of the file if present, the process default otherwise.
/// Returns the number of bytes written.
pub fn apply_zstd(packed: Bytes<'_>, compressed: &mut [u8], level: Option<u8>) -> Result<usize, PipelineError> {
    let level = level.unwrap_or_else(config::default_zstd_compression_level);
    let parameters = ChunkParameters::shuffle(PIPELINE_TYPE_SIZE, level);

    let chunk = CompressedChunk::encode(packed, parameters).map_err(PipelineError::Unknown)?;

    if chunk.is_empty() || chunk.len() > compressed.len() {
        return Err(PipelineError::Unknown(Error::capacity(format!(
            "compressed chunk of {} bytes does not fit into {} bytes",
            chunk.len(), compressed.len()
        ))));
    }

    compressed[.. chunk.len()].copy_from_slice(chunk.as_bytes());
    Ok(chunk.len())
}

/// Decompress a chunk into the uncompressed buffer,
/// which must have exactly the size of the decompressed bytes.
pub fn undo_zstd(compressed: Bytes<'_>, uncompressed: &mut [u8]) -> Result<usize, PipelineError> {
    let decompressed = decode_chunk(compressed, uncompressed.len())
        .map_err(PipelineError::CorruptChunk)?;

    if decompressed.len() != uncompressed.len() {
        return Err(PipelineError::CorruptChunk(Error::invalid("decompressed byte count")));
    }

    uncompressed.copy_from_slice(&decompressed);
    Ok(decompressed.len())
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::chunk::max_chunk_byte_size;

    fn packed_bytes() -> Vec<u8> {
        (0 .. 2000_u32).flat_map(|index| ((index / 10) as u16).to_le_bytes()).collect()
    }

    #[test]
    fn apply_then_undo(){
        let packed = packed_bytes();
        let mut compressed = vec![ 0_u8; max_chunk_byte_size(packed.len()) ];

        let size = apply_zstd(&packed, &mut compressed, Some(4)).unwrap();
        assert!(size > 0 && size < packed.len());

        let mut uncompressed = vec![ 0_u8; packed.len() ];
        assert_eq!(undo_zstd(&compressed[.. size], &mut uncompressed).unwrap(), packed.len());
        assert_eq!(uncompressed, packed);
    }

    #[test]
    fn wrong_sizes_are_corrupt(){
        let packed = packed_bytes();
        let mut compressed = vec![ 0_u8; max_chunk_byte_size(packed.len()) ];
        let size = apply_zstd(&packed, &mut compressed, None).unwrap();

        let mut too_small = vec![ 0_u8; packed.len() - 1 ];
        assert!(matches!(undo_zstd(&compressed[.. size], &mut too_small), Err(PipelineError::CorruptChunk(_))));

        let mut uncompressed = vec![ 0_u8; packed.len() ];
        assert!(matches!(undo_zstd(&compressed[.. size - 1], &mut uncompressed), Err(PipelineError::CorruptChunk(_))));
    }

    #[test]
    fn invalid_level_is_unknown_error(){
        let mut compressed = vec![ 0_u8; 1024 ];
        assert!(matches!(apply_zstd(&[ 1, 2 ], &mut compressed, Some(0)), Err(PipelineError::Unknown(Error::Configuration(_)))));
    }
}
