use super::*;
use super::optimize_bytes::*;

// inspired by  https://github.com/openexr/openexr/blob/master/OpenEXR/IlmImf/ImfRle.cpp

const MIN_RUN_LENGTH : usize = 3;
const MAX_RUN_LENGTH : usize = 127;


pub fn decompress_bytes(mut remaining: Bytes<'_>, expected_byte_size: usize) -> Result<ByteVec> {
    let mut decompressed = Vec::with_capacity(expected_byte_size.min(8*2048));

    while !remaining.is_empty() {
        let count = take_1(&mut remaining)? as i8 as i32;

        if count < 0 {
            // take the next '-count' bytes as-is
            let values = take_n(&mut remaining, (-count) as usize)?;
            decompressed.extend_from_slice(values);
        }
        else {
            // repeat the next value 'count + 1' times
            let value = take_1(&mut remaining)?;
            decompressed.resize(decompressed.len() + count as usize + 1, value);
        }

        if decompressed.len() > expected_byte_size {
            return Err(Error::invalid("run-length encoded data exceeds the block size"));
        }
    }

    differences_to_samples(&mut decompressed);
    interleave_byte_blocks(&mut decompressed);
    Ok(decompressed)
}

pub fn compress_bytes(uncompressed: Bytes<'_>, data: &mut ByteVec) -> ByteVec {
    data.clear();
    data.extend_from_slice(uncompressed);

    separate_bytes_fragments(data);
    samples_to_differences(data);

    let mut compressed = Vec::with_capacity(data.len());
    let mut run_start = 0;
    let mut run_end = 1;

    while run_start < data.len() {
        while run_end < data.len()
            && data[run_start] == data[run_end]
            && run_end - run_start <= MAX_RUN_LENGTH
        {
            run_end += 1;
        }

        if run_end - run_start >= MIN_RUN_LENGTH {
            compressed.push((run_end - run_start - 1) as u8);
            compressed.push(data[run_start]);
            run_start = run_end;
        }
        else {
            while run_end < data.len()
                && (
                    (run_end + 1 >= data.len() || data[run_end] != data[run_end + 1])
                    || (run_end + 2 >= data.len() || data[run_end + 1] != data[run_end + 2])
                )
                && run_end - run_start < MAX_RUN_LENGTH
            {
                run_end += 1;
            }

            compressed.push((run_start as i32 - run_end as i32) as u8);
            compressed.extend_from_slice(&data[run_start .. run_end]);

            run_start = run_end;
            run_end += 1;
        }
    }

    compressed
}

fn take_1(slice: &mut &[u8]) -> Result<u8> {
    let (&first, rest) = slice.split_first()
        .ok_or_else(|| Error::invalid("run-length encoded data"))?;

    *slice = rest;
    Ok(first)
}

fn take_n<'s>(slice: &mut &'s [u8], n: usize) -> Result<&'s [u8]> {
    if n <= slice.len() {
        let (front, back) = slice.split_at(n);
        *slice = back;
        Ok(front)
    }
    else {
        Err(Error::invalid("run-length encoded data"))
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrip_short_runs(){
        let data = vec![ 0, 23, 4, 4, 4, 4, 4, 4, 4, 4, 4, 5, 0, 0, 0, 1, 23, 43, 4];
        let compressed = compress_bytes(&data, &mut ByteVec::new());
        assert_eq!(decompress_bytes(&compressed, data.len()).unwrap(), data);
    }

    #[test]
    fn roundtrip_long_runs_and_noise(){
        let mut data = vec![ 9_u8; 1000 ];
        data.extend((0 .. 1000).map(|_| rand::random::<u8>()));
        data.extend(vec![ 3_u8; 129 ]);

        let compressed = compress_bytes(&data, &mut ByteVec::new());
        assert_eq!(decompress_bytes(&compressed, data.len()).unwrap(), data);
    }

    #[test]
    fn truncated_input_is_invalid(){
        // a literal run of five bytes, but only two follow
        assert!(matches!(decompress_bytes(&[ (-5_i8) as u8, 1, 2 ], 5), Err(Error::Invalid(_))));

        // a repeated run without its value
        assert!(matches!(decompress_bytes(&[ 4 ], 5), Err(Error::Invalid(_))));

        // more bytes than the block holds
        assert!(matches!(decompress_bytes(&[ 100, 0 ], 5), Err(Error::Invalid(_))));
    }
}
