// see https://github.com/openexr/openexr/blob/master/OpenEXR/IlmImf/ImfZip.cpp

use super::*;
use super::optimize_bytes::*;


/// Inflate zlib data, refusing to produce more than the expected number of bytes.
pub fn inflate(compressed: Bytes<'_>, expected_byte_size: usize) -> Result<ByteVec> {
    let options = zune_inflate::DeflateOptions::default()
        .set_limit(expected_byte_size)
        .set_size_hint(expected_byte_size);

    zune_inflate::DeflateDecoder::new_with_options(compressed, options)
        .decode_zlib()
        .map_err(|_| Error::invalid("zlib-compressed data malformed"))
}

/// Deflate the bytes into a zlib stream.
pub fn deflate(uncompressed: Bytes<'_>, level: u8) -> ByteVec {
    miniz_oxide::deflate::compress_to_vec_zlib(uncompressed, level)
}

pub fn decompress_bytes(compressed: Bytes<'_>, expected_byte_size: usize) -> Result<ByteVec> {
    let mut decompressed = inflate(compressed, expected_byte_size)?;

    differences_to_samples(&mut decompressed);
    interleave_byte_blocks(&mut decompressed);
    Ok(decompressed)
}

pub fn compress_bytes(uncompressed: Bytes<'_>, level: u8, packed: &mut ByteVec) -> ByteVec {
    packed.clear();
    packed.extend_from_slice(uncompressed);

    separate_bytes_fragments(packed);
    samples_to_differences(packed);

    deflate(packed, level)
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrip_at_all_levels(){
        let data: ByteVec = (0 .. 3000_u32).map(|index| (index / 7) as u8).collect();
        let mut scratch = ByteVec::new();

        for level in 0 ..= 9 {
            let compressed = compress_bytes(&data, level, &mut scratch);
            assert_eq!(decompress_bytes(&compressed, data.len()).unwrap(), data);
        }
    }

    #[test]
    fn inflate_respects_limit(){
        let data = vec![ 7_u8; 4096 ];
        let compressed = deflate(&data, 4);

        assert!(inflate(&compressed, 100).is_err());
        assert_eq!(inflate(&compressed, 4096).unwrap(), data);
    }
}
