// see https://github.com/AcademySoftwareFoundation/openexr/blob/master/OpenEXR/IlmImf/ImfPxr24Compressor.cpp

//! Lossy compression for F32 data, but lossless compression for U32 and F16 data.

//  The compressor converts the pixel values to unsigned integers:
//  U32 stays as is, F16 values are re-interpreted as 16-bit integers,
//  and F32 values are rounded to 24 bits. Each value is then replaced
//  with the difference to its left neighbour, which turns flat fields into zeroes.
//  Each difference is split into 2, 3 or 4 bytes, and the bytes are transposed
//  so that all the most significant bytes of a row end up in a contiguous block.
//  The resulting string of bytes is compressed with zlib.

use super::*;
use crate::io::Data;


/// How many bytes of a difference are stored for each sample type.
fn byte_planes(sample_type: SampleType) -> usize {
    match sample_type {
        SampleType::F16 => 2,
        SampleType::F32 => 3,
        SampleType::U32 => 4,
    }
}

pub fn compress(channels: &ChannelList, uncompressed: Bytes<'_>, area: IntegerBounds, level: u8) -> Result<ByteVec> {
    if uncompressed.is_empty() { return Ok(Vec::new()); }

    let mut remaining = uncompressed;
    let mut planes = Vec::with_capacity(uncompressed.len());

    for y in area.position.y() .. area.end()?.y() {
        for channel in &channels.list {
            let sample_count = channel.samples_in_row(y, area)?;
            let plane_count = byte_planes(channel.sample_type);

            let start = planes.len();
            planes.resize(start + sample_count * plane_count, 0);
            let row = &mut planes[start ..];

            let mut previous_pixel: u32 = 0;

            for index in 0 .. sample_count {
                let pixel = match channel.sample_type {
                    SampleType::F16 => u32::from(u16::read(&mut remaining)?),
                    SampleType::U32 => u32::read(&mut remaining)?,
                    SampleType::F32 => f32_to_f24(f32::read(&mut remaining)?),
                };

                let difference = pixel.wrapping_sub(previous_pixel);
                previous_pixel = pixel;

                for plane in 0 .. plane_count {
                    let shift = 8 * (plane_count - 1 - plane);
                    row[plane * sample_count + index] = (difference >> shift) as u8;
                }
            }
        }
    }

    if !remaining.is_empty() {
        return Err(Error::invalid("pxr24 input exceeds the block size"));
    }

    Ok(super::zip::deflate(&planes, level))
}

pub fn decompress(channels: &ChannelList, compressed: Bytes<'_>, area: IntegerBounds, expected_byte_size: usize) -> Result<ByteVec> {
    if compressed.is_empty() { return Ok(Vec::new()) }

    let planes = super::zip::inflate(compressed, expected_byte_size)?;
    let mut remaining = planes.as_slice();
    let mut decompressed = Vec::with_capacity(expected_byte_size);

    for y in area.position.y() .. area.end()?.y() {
        for channel in &channels.list {
            let sample_count = channel.samples_in_row(y, area)?;
            let plane_count = byte_planes(channel.sample_type);

            let row_byte_size = sample_count.checked_mul(plane_count)
                .ok_or_else(|| Error::invalid("pxr24 row size"))?;

            if row_byte_size > remaining.len() {
                return Err(Error::invalid("not enough pxr24 data"));
            }

            let (row, rest) = remaining.split_at(row_byte_size);
            remaining = rest;

            let mut pixel_accumulation: u32 = 0;

            for index in 0 .. sample_count {
                let mut difference: u32 = 0;
                for plane in 0 .. plane_count {
                    difference = (difference << 8) | u32::from(row[plane * sample_count + index]);
                }

                match channel.sample_type {
                    SampleType::F16 => {
                        pixel_accumulation = pixel_accumulation.wrapping_add(difference);
                        (pixel_accumulation as u16).write(&mut decompressed)?;
                    },

                    SampleType::U32 => {
                        pixel_accumulation = pixel_accumulation.wrapping_add(difference);
                        pixel_accumulation.write(&mut decompressed)?;
                    },

                    // the 24 bits are the most significant bits of the float
                    SampleType::F32 => {
                        pixel_accumulation = pixel_accumulation.wrapping_add(difference << 8);
                        pixel_accumulation.write(&mut decompressed)?;
                    },
                }
            }
        }
    }

    if !remaining.is_empty() {
        return Err(Error::invalid("too much pxr24 data"));
    }

    Ok(decompressed)
}


/// Conversion from 32-bit to 24-bit floating-point numbers.
/// Reverse conversion is just a simple 8-bit left shift.
pub fn f32_to_f24(float: f32) -> u32 {
    let bits = float.to_bits();

    let sign = bits & 0x8000_0000;
    let exponent = bits & 0x7f80_0000;
    let mantissa = bits & 0x007f_ffff;

    let result = if exponent == 0x7f80_0000 {
        if mantissa != 0 {
            // keep the 15 leftmost bits of a NaN,
            // but never turn it into an infinity
            let mantissa = mantissa >> 8;
            (exponent >> 8) | mantissa | if mantissa == 0 { 1 } else { 0 }
        }
        else { // infinity
            exponent >> 8
        }
    }
    else { // finite, round the significand to 15 bits
        let result = ((exponent | mantissa) + (mantissa & 0x0000_0080)) >> 8;

        // rounding up close to the maximum would overflow the exponent, truncate instead
        if result >= 0x7f_8000 { (exponent | mantissa) >> 8 }
        else { result }
    };

    (sign >> 8) | result
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::meta::attribute::ChannelDescription;

    #[test]
    fn special_floats_survive(){
        assert_eq!(f32::from_bits(f32_to_f24(f32::INFINITY) << 8), f32::INFINITY);
        assert_eq!(f32::from_bits(f32_to_f24(f32::NEG_INFINITY) << 8), f32::NEG_INFINITY);
        assert!(f32::from_bits(f32_to_f24(f32::NAN) << 8).is_nan());
        assert_eq!(f32::from_bits(f32_to_f24(f32::MAX) << 8), f32::from_bits(f32::MAX.to_bits() & !0xff));
    }

    #[test]
    fn float_error_is_bounded(){
        let channels = ChannelList::new(smallvec![ ChannelDescription::new("Z", SampleType::F32, false) ]);
        let area = IntegerBounds::from_dimensions((32, 16));

        let values: Vec<f32> = (0 .. 32 * 16).map(|_| rand::random::<f32>() * 1000.0 + 1.0).collect();
        let mut bytes = ByteVec::new();
        f32::write_slice(&mut bytes, &values).unwrap();

        let compressed = compress(&channels, &bytes, area, 4).unwrap();
        let decompressed = decompress(&channels, &compressed, area, bytes.len()).unwrap();
        let decoded = f32::read_vec(&mut decompressed.as_slice(), values.len()).unwrap();

        for (original, decoded) in values.iter().zip(decoded) {
            assert!(((original - decoded) / original).abs() < 1.0 / 32768.0);
        }
    }

    #[test]
    fn subsampled_channels_roundtrip(){
        let mut chroma = ChannelDescription::new("BY", SampleType::F16, true);
        chroma.sampling = Vec2(2, 2);

        let channels = ChannelList::new(smallvec![ chroma, ChannelDescription::new("Y", SampleType::U32, true) ]);
        let area = IntegerBounds::from_dimensions((8, 4));

        let byte_size = channels.byte_size_of(area).unwrap();
        let bytes: ByteVec = (0 .. byte_size).map(|_| rand::random::<u8>()).collect();

        let compressed = compress(&channels, &bytes, area, 6).unwrap();
        assert_eq!(decompress(&channels, &compressed, area, byte_size).unwrap(), bytes);
    }

    #[test]
    fn truncated_planes_are_invalid(){
        let channels = ChannelList::new(smallvec![ ChannelDescription::new("Y", SampleType::U32, true) ]);
        let area = IntegerBounds::from_dimensions((8, 4));

        let planes = super::super::zip::deflate(&[ 0_u8; 8 * 4 * 4 - 1 ], 4);
        assert!(matches!(decompress(&channels, &planes, area, 8 * 4 * 4), Err(Error::Invalid(_))));
    }
}
