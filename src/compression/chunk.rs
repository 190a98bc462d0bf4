//! Packages a single byte buffer as one self-describing compressed chunk,
//! using the zstandard library as the entropy coder.
//!
//! A chunk consists of a fixed size header, an optional trained dictionary,
//! and a single zstandard frame. All numbers are little-endian.
//!
//! | bytes | content                                              |
//! |-------|------------------------------------------------------|
//! | 4     | magic number `EXZC`                                  |
//! | 1     | format version, currently `1`                        |
//! | 1     | flags: bit 0 dictionary present, bit 1 truncated     |
//! | 1     | algorithm                                            |
//! | 1     | type size in bytes                                   |
//! | 1     | compression level, `1` to `9`                        |
//! | 3     | reserved, always zero                                |
//! | 8     | uncompressed byte size                               |
//! | 4     | dictionary byte size                                 |
//! | 4     | payload byte size                                    |
//!
//! Before compression, float samples may be truncated, and the bytes of all samples
//! are shuffled such that the first byte of every sample comes first,
//! followed by the second byte of every sample, and so on.

use std::ops::RangeInclusive;
use std::sync::OnceLock;
use bit_field::BitField;
use log::{debug, trace};

use crate::compression::{ByteVec, Bytes, config};
use crate::meta::attribute::SampleType;
use crate::io::{Data, Write};
use crate::error::{Error, Result, UnitResult, u64_to_usize, usize_to_u32};


/// The first bytes of every chunk.
pub const CHUNK_MAGIC: [u8; 4] = *b"EXZC";

/// The only chunk format this version can read and write.
pub const CHUNK_FORMAT_VERSION: u8 = 1;

/// Number of bytes before the dictionary and the payload of a chunk.
pub const CHUNK_HEADER_BYTE_SIZE: usize = 28;

const DICTIONARY_FLAG_BIT: usize = 0;
const TRUNCATED_FLAG_BIT: usize = 1;

/// Float samples keep their 16 most significant mantissa bits.
const TRUNCATED_FLOAT_MASK: u32 = !0x7f;

/// Dictionaries are only trained on inputs of at least this many bytes.
const MIN_DICTIONARY_INPUT_BYTE_SIZE: usize = 16 * 1024;
const DICTIONARY_SAMPLE_BYTE_SIZE: usize = 1024;
const MAX_DICTIONARY_BYTE_SIZE: usize = 16 * 1024;


/// Selects how the samples are prepared before entropy coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkAlgorithm {

    /// Shuffle the bytes of each sample. Lossless.
    Shuffle,

    /// Truncate 32-bit floats to 16 mantissa bits, then shuffle.
    /// The relative error of normal numbers stays below 2^-16.
    /// Subnormals, infinities and NaN are kept as they are.
    TruncatedFloat,

    /// Shuffle, then try to model the bytes with a trained dictionary.
    /// Pays off for tables with few distinct values, such as deep sample counts. Lossless.
    Dictionary,
}

/// Everything needed to compress a single chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParameters {

    /// The number of bytes per sample, used for shuffling.
    pub type_size: usize,

    /// The compression level, between 1 and 9.
    pub level: u8,

    /// How the samples are prepared.
    pub algorithm: ChunkAlgorithm,
}

/// The parsed header of a compressed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {

    /// How the samples were prepared.
    pub algorithm: ChunkAlgorithm,

    /// The number of bytes per sample.
    pub type_size: usize,

    /// The compression level, between 1 and 9.
    pub level: u8,

    /// The byte count that decompressing this chunk produces.
    pub uncompressed_byte_size: usize,

    /// Zero if no dictionary is stored.
    pub dictionary_byte_size: usize,

    /// The byte size of the zstandard frame.
    pub payload_byte_size: usize,
}

/// A compressed buffer, including its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedChunk {
    bytes: ByteVec,
}

/// Facts about the zstandard library, gathered once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryState {

    /// The version number of the linked zstandard library.
    pub version: u32,

    /// The compression levels the library accepts.
    pub levels: RangeInclusive<i32>,
}

static LIBRARY_STATE: OnceLock<LibraryState> = OnceLock::new();


/// Query the zstandard library on first use. Later calls return the same state.
/// The state lives until the process exits.
pub fn ensure_initialized() -> &'static LibraryState {
    LIBRARY_STATE.get_or_init(|| {
        let state = LibraryState {
            version: zstd::zstd_safe::version_number(),
            levels: zstd::compression_level_range(),
        };

        debug!("using zstd library version {} with levels {:?}", state.version, state.levels);
        state
    })
}

impl LibraryState {

    /// Map a level between 1 and 9 to a zstandard level.
    /// Level 9 uses the strongest level the library offers.
    pub fn zstd_level(&self, level: u8) -> i32 {
        let (min, max) = (*self.levels.start(), *self.levels.end());

        if level >= 9 { max }
        else { (2 * i32::from(level) - 1).clamp(min.max(1), max) }
    }
}

/// The largest chunk that compressing the specified number of bytes can produce.
pub fn max_chunk_byte_size(uncompressed_byte_size: usize) -> usize {
    CHUNK_HEADER_BYTE_SIZE + zstd::zstd_safe::compress_bound(uncompressed_byte_size)
}


impl ChunkAlgorithm {

    /// Half floats are shuffled, floats are truncated, and integers use a dictionary.
    pub fn for_sample_type(sample_type: SampleType) -> Self {
        match sample_type {
            SampleType::F16 => ChunkAlgorithm::Shuffle,
            SampleType::F32 => ChunkAlgorithm::TruncatedFloat,
            SampleType::U32 => ChunkAlgorithm::Dictionary,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            ChunkAlgorithm::Shuffle => 0,
            ChunkAlgorithm::TruncatedFloat => 1,
            ChunkAlgorithm::Dictionary => 2,
        }
    }

    fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ChunkAlgorithm::Shuffle),
            1 => Ok(ChunkAlgorithm::TruncatedFloat),
            2 => Ok(ChunkAlgorithm::Dictionary),
            _ => Err(Error::invalid(format!("unknown chunk algorithm {}", value))),
        }
    }
}

impl ChunkParameters {

    /// The parameters that fit the sample type best.
    pub fn for_sample_type(sample_type: SampleType, level: u8) -> Self {
        ChunkParameters {
            type_size: sample_type.bytes_per_sample(),
            level,
            algorithm: ChunkAlgorithm::for_sample_type(sample_type),
        }
    }

    /// Lossless parameters for arbitrary samples of the specified byte size.
    pub fn shuffle(type_size: usize, level: u8) -> Self {
        ChunkParameters { type_size, level, algorithm: ChunkAlgorithm::Shuffle }
    }

    /// Returns an error for levels outside 1 to 9, type sizes outside 1 to 255,
    /// and truncation of anything but 32-bit samples.
    pub fn validate(&self) -> UnitResult {
        config::validate_zstd_compression_level(i32::from(self.level))?;

        if self.type_size == 0 || self.type_size > usize::from(u8::MAX) {
            return Err(Error::configuration(format!("chunk type size {} is not between 1 and 255", self.type_size)));
        }

        if self.algorithm == ChunkAlgorithm::TruncatedFloat && self.type_size != 4 {
            return Err(Error::configuration("float truncation requires a type size of 4"));
        }

        Ok(())
    }
}


impl ChunkHeader {

    /// Read and validate the header at the start of the slice.
    /// Does not check the length of the remaining bytes.
    pub fn read(read: &mut &[u8]) -> Result<Self> {
        if read.len() < CHUNK_HEADER_BYTE_SIZE {
            return Err(Error::invalid("truncated chunk header"));
        }

        let mut magic = [0_u8; 4];
        u8::read_slice(read, &mut magic)?;
        if magic != CHUNK_MAGIC {
            return Err(Error::invalid("chunk magic number"));
        }

        let version = u8::read(read)?;
        if version != CHUNK_FORMAT_VERSION {
            return Err(Error::invalid(format!("unsupported chunk format version {}", version)));
        }

        let flags = u8::read(read)?;
        if flags.get_bits(2 .. 8) != 0 {
            return Err(Error::invalid("unknown chunk flags"));
        }

        let algorithm = ChunkAlgorithm::from_u8(u8::read(read)?)?;
        let type_size = usize::from(u8::read(read)?);
        let level = u8::read(read)?;

        let mut reserved = [0_u8; 3];
        u8::read_slice(read, &mut reserved)?;
        if reserved != [0; 3] {
            return Err(Error::invalid("reserved chunk header bytes"));
        }

        let header = ChunkHeader {
            algorithm, type_size, level,
            uncompressed_byte_size: u64_to_usize(u64::read(read)?, "chunk uncompressed size")?,
            dictionary_byte_size: u32::read(read)? as usize,
            payload_byte_size: u32::read(read)? as usize,
        };

        if flags.get_bit(DICTIONARY_FLAG_BIT) != (header.dictionary_byte_size > 0)
            || flags.get_bit(TRUNCATED_FLAG_BIT) != (algorithm == ChunkAlgorithm::TruncatedFloat)
        {
            return Err(Error::invalid("inconsistent chunk flags"));
        }

        header.parameters().validate()
            .map_err(|_| Error::invalid("chunk parameters"))?;

        Ok(header)
    }

    /// Write this header, including magic number and version.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        let mut flags = 0_u8;
        flags.set_bit(DICTIONARY_FLAG_BIT, self.dictionary_byte_size > 0);
        flags.set_bit(TRUNCATED_FLAG_BIT, self.algorithm == ChunkAlgorithm::TruncatedFloat);

        u8::write_slice(write, &CHUNK_MAGIC)?;
        CHUNK_FORMAT_VERSION.write(write)?;
        flags.write(write)?;
        self.algorithm.to_u8().write(write)?;
        (self.type_size as u8).write(write)?;
        self.level.write(write)?;
        u8::write_slice(write, &[0; 3])?;

        (self.uncompressed_byte_size as u64).write(write)?;
        usize_to_u32(self.dictionary_byte_size, "dictionary too large")?.write(write)?;
        usize_to_u32(self.payload_byte_size, "chunk payload too large")?.write(write)?;
        Ok(())
    }

    /// The parameters this chunk was compressed with.
    pub fn parameters(&self) -> ChunkParameters {
        ChunkParameters { type_size: self.type_size, level: self.level, algorithm: self.algorithm }
    }

    /// The byte size of the whole chunk, including this header.
    pub fn chunk_byte_size(&self) -> Result<usize> {
        CHUNK_HEADER_BYTE_SIZE.checked_add(self.dictionary_byte_size)
            .and_then(|size| size.checked_add(self.payload_byte_size))
            .ok_or_else(|| Error::invalid("chunk size"))
    }
}


impl CompressedChunk {

    /// Compress the bytes. The number of bytes need not be a multiple of the type size.
    /// Fails if the parameters are invalid or the entropy coder fails.
    pub fn encode(uncompressed: Bytes<'_>, parameters: ChunkParameters) -> Result<Self> {
        parameters.validate()?;
        let level = ensure_initialized().zstd_level(parameters.level);

        let prepared = {
            if parameters.algorithm == ChunkAlgorithm::TruncatedFloat {
                let mut truncated = uncompressed.to_vec();
                truncate_float_precision(&mut truncated);
                shuffle_bytes(&truncated, parameters.type_size)
            }
            else {
                shuffle_bytes(uncompressed, parameters.type_size)
            }
        };

        let mut payload = zstd::bulk::compress(&prepared, level)
            .map_err(|error| Error::encode(format!("zstd compression failed ({})", error)))?;

        let mut dictionary = ByteVec::new();

        if parameters.algorithm == ChunkAlgorithm::Dictionary && prepared.len() >= MIN_DICTIONARY_INPUT_BYTE_SIZE {
            match compress_with_trained_dictionary(&prepared, level) {
                Ok((trained, dictionary_payload)) => {
                    if trained.len() + dictionary_payload.len() < payload.len() {
                        debug!(
                            "using a trained dictionary of {} bytes, saving {} bytes",
                            trained.len(), payload.len() - trained.len() - dictionary_payload.len()
                        );

                        dictionary = trained;
                        payload = dictionary_payload;
                    }
                    else {
                        debug!("rejected a trained dictionary of {} bytes", trained.len());
                    }
                },

                Err(error) => debug!("dictionary training failed, compressing without ({})", error),
            }
        }

        let bound = zstd::zstd_safe::compress_bound(prepared.len());
        if payload.is_empty() || dictionary.len() + payload.len() > bound {
            return Err(Error::encode(format!(
                "zstd produced {} bytes, exceeding its bound of {} bytes",
                dictionary.len() + payload.len(), bound
            )));
        }

        let header = ChunkHeader {
            algorithm: parameters.algorithm,
            type_size: parameters.type_size,
            level: parameters.level,
            uncompressed_byte_size: uncompressed.len(),
            dictionary_byte_size: dictionary.len(),
            payload_byte_size: payload.len(),
        };

        let mut bytes = Vec::with_capacity(header.chunk_byte_size()?);
        header.write(&mut bytes)?;
        bytes.extend_from_slice(&dictionary);
        bytes.extend_from_slice(&payload);

        trace!("encoded {} bytes into a chunk of {} bytes ({:?})", uncompressed.len(), bytes.len(), parameters.algorithm);
        Ok(CompressedChunk { bytes })
    }

    /// Decompress this chunk, which must contain the expected number of bytes.
    pub fn decode(&self, expected_byte_size: usize) -> Result<ByteVec> {
        decode_chunk(&self.bytes, expected_byte_size)
    }

    /// Parse the header of this chunk.
    pub fn header(&self) -> Result<ChunkHeader> {
        read_chunk_header(&self.bytes)
    }

    /// The compressed bytes, including the header.
    pub fn as_bytes(&self) -> Bytes<'_> { &self.bytes }

    /// The compressed bytes, including the header.
    pub fn into_bytes(self) -> ByteVec { self.bytes }

    /// The byte size of the whole chunk.
    pub fn len(&self) -> usize { self.bytes.len() }

    /// Never true for chunks created by `encode`.
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
}

/// Parse the header of a compressed chunk.
pub fn read_chunk_header(bytes: Bytes<'_>) -> Result<ChunkHeader> {
    ChunkHeader::read(&mut &bytes[..])
}

/// Decompress a whole chunk. The chunk must declare exactly the expected byte size,
/// and must not be followed by any other bytes.
pub fn decode_chunk(bytes: Bytes<'_>, expected_byte_size: usize) -> Result<ByteVec> {
    let mut remaining = bytes;
    let header = ChunkHeader::read(&mut remaining)?;

    if header.uncompressed_byte_size != expected_byte_size {
        return Err(Error::invalid(format!(
            "chunk contains {} bytes instead of the expected {} bytes",
            header.uncompressed_byte_size, expected_byte_size
        )));
    }

    if header.chunk_byte_size()? != bytes.len() {
        return Err(Error::invalid(format!(
            "chunk of {} bytes declares {} bytes",
            bytes.len(), header.chunk_byte_size()?
        )));
    }

    let (dictionary, payload) = remaining.split_at(header.dictionary_byte_size);

    let shuffled = {
        if dictionary.is_empty() {
            zstd::bulk::decompress(payload, expected_byte_size)
        }
        else {
            zstd::bulk::Decompressor::with_dictionary(dictionary)
                .and_then(|mut decompressor| decompressor.decompress(payload, expected_byte_size))
        }
    };

    let shuffled = shuffled
        .map_err(|error| Error::invalid(format!("zstd decompression failed ({})", error)))?;

    if shuffled.len() != expected_byte_size {
        return Err(Error::invalid(format!(
            "chunk decompressed to {} bytes instead of {} bytes",
            shuffled.len(), expected_byte_size
        )));
    }

    trace!("decoded a chunk of {} bytes into {} bytes", bytes.len(), shuffled.len());
    Ok(unshuffle_bytes(&shuffled, header.type_size))
}


fn compress_with_trained_dictionary(prepared: Bytes<'_>, level: i32) -> std::io::Result<(ByteVec, ByteVec)> {
    let sample_sizes: Vec<usize> = prepared.chunks(DICTIONARY_SAMPLE_BYTE_SIZE).map(<[u8]>::len).collect();
    let max_dictionary_size = (prepared.len() / 8).min(MAX_DICTIONARY_BYTE_SIZE);

    let dictionary = zstd::dict::from_continuous(prepared, &sample_sizes, max_dictionary_size)?;
    let payload = zstd::bulk::Compressor::with_dictionary(level, &dictionary)?.compress(prepared)?;
    Ok((dictionary, payload))
}

/// Clear the least significant mantissa bits of all normal 32-bit floats.
/// Zeroes, subnormals, infinities and NaN keep all their bits.
fn truncate_float_precision(bytes: &mut [u8]) {
    for sample in bytes.chunks_exact_mut(4) {
        let bits = u32::from_le_bytes([ sample[0], sample[1], sample[2], sample[3] ]);

        let exponent = bits & 0x7f80_0000;
        if exponent != 0 && exponent != 0x7f80_0000 {
            sample.copy_from_slice(&(bits & TRUNCATED_FLOAT_MASK).to_le_bytes());
        }
    }
}

/// Group the bytes by their position within the sample.
/// Trailing bytes that do not form a whole sample are appended unchanged.
fn shuffle_bytes(bytes: Bytes<'_>, type_size: usize) -> ByteVec {
    if type_size < 2 { return bytes.to_vec(); }

    let samples_byte_size = bytes.len() / type_size * type_size;
    let (samples, remainder) = bytes.split_at(samples_byte_size);

    let mut shuffled = Vec::with_capacity(bytes.len());
    for byte_index in 0 .. type_size {
        shuffled.extend(samples.iter().skip(byte_index).step_by(type_size));
    }

    shuffled.extend_from_slice(remainder);
    shuffled
}

/// Reverse `shuffle_bytes`.
fn unshuffle_bytes(shuffled: Bytes<'_>, type_size: usize) -> ByteVec {
    let sample_count = shuffled.len() / type_size.max(1);
    if type_size < 2 || sample_count == 0 { return shuffled.to_vec(); }

    let (planes, remainder) = shuffled.split_at(sample_count * type_size);
    let mut bytes = vec![0_u8; shuffled.len()];

    for (byte_index, plane) in planes.chunks_exact(sample_count).enumerate() {
        for (sample_index, &byte) in plane.iter().enumerate() {
            bytes[sample_index * type_size + byte_index] = byte;
        }
    }

    bytes[planes.len() ..].copy_from_slice(remainder);
    bytes
}


#[cfg(test)]
mod test {
    use super::*;

    fn half_float_bytes(count: usize) -> ByteVec {
        let values: Vec<half::f16> = (0 .. count)
            .map(|index| half::f16::from_f32((index as f32 * 0.01).cos()))
            .collect();

        let mut bytes = ByteVec::new();
        half::f16::write_slice(&mut bytes, &values).unwrap();
        bytes
    }

    #[test]
    fn shuffle_groups_bytes_and_keeps_remainder(){
        let bytes = [ 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11 ];
        let shuffled = shuffle_bytes(&bytes, 4);
        assert_eq!(shuffled, vec![ 1, 5, 2, 6, 3, 7, 4, 8, 9, 10, 11 ]);
        assert_eq!(unshuffle_bytes(&shuffled, 4), bytes.to_vec());

        assert_eq!(unshuffle_bytes(&[ 1, 2, 3 ], 4), vec![ 1, 2, 3 ]);
        assert_eq!(shuffle_bytes(&[ 1, 2, 3 ], 1), vec![ 1, 2, 3 ]);
    }

    #[test]
    fn roundtrip_is_exact_for_shuffle_and_dictionary(){
        let halves = half_float_bytes(5000);
        let chunk = CompressedChunk::encode(&halves, ChunkParameters::for_sample_type(SampleType::F16, 5)).unwrap();
        assert!(chunk.len() < halves.len());
        assert_eq!(chunk.decode(halves.len()).unwrap(), halves);

        let mut counts = ByteVec::new();
        let table: Vec<u32> = (0 .. 20_000).map(|index| (index % 4) as u32).collect();
        u32::write_slice(&mut counts, &table).unwrap();

        let chunk = CompressedChunk::encode(&counts, ChunkParameters::for_sample_type(SampleType::U32, 3)).unwrap();
        assert_eq!(chunk.header().unwrap().algorithm, ChunkAlgorithm::Dictionary);
        assert_eq!(chunk.decode(counts.len()).unwrap(), counts);
    }

    #[test]
    fn truncated_floats_have_bounded_error(){
        let values: Vec<f32> = (0 .. 4000).map(|_| rand::random::<f32>() * 100.0 + 0.5)
            .chain(vec![ f32::INFINITY, f32::NEG_INFINITY, 0.0, -0.0 ])
            .collect();

        let mut bytes = ByteVec::new();
        f32::write_slice(&mut bytes, &values).unwrap();

        let chunk = CompressedChunk::encode(&bytes, ChunkParameters::for_sample_type(SampleType::F32, 9)).unwrap();
        let decoded = chunk.decode(bytes.len()).unwrap();
        let decoded = f32::read_vec(&mut decoded.as_slice(), values.len()).unwrap();

        for (&original, &decoded) in values.iter().zip(decoded.iter()) {
            if original.is_finite() && original != 0.0 {
                assert!(((original - decoded) / original).abs() < 1.0 / 65536.0);
            }
            else {
                assert_eq!(original.to_bits(), decoded.to_bits());
            }
        }
    }

    #[test]
    fn subnormals_are_kept(){
        let values = [ 9.7e-44_f32, 1.0e-40, -3.0e-39, 3.5, f32::from_bits(0x007f_ffff) ];
        assert!(values.iter().all(|value| value.is_subnormal() || *value == 3.5));

        let mut bytes = ByteVec::new();
        f32::write_slice(&mut bytes, &values).unwrap();

        let chunk = CompressedChunk::encode(&bytes, ChunkParameters::for_sample_type(SampleType::F32, 3)).unwrap();
        assert_eq!(chunk.decode(bytes.len()).unwrap(), bytes);

        let mut truncated = bytes.clone();
        truncate_float_precision(&mut truncated);
        assert_eq!(truncated, bytes);
    }

    #[test]
    fn nan_is_kept(){
        let nan = f32::from_bits(0x7fc0_0001);
        let chunk = CompressedChunk::encode(&nan.to_le_bytes(), ChunkParameters::for_sample_type(SampleType::F32, 1)).unwrap();
        assert_eq!(chunk.decode(4).unwrap(), nan.to_le_bytes().to_vec());
    }

    #[test]
    fn empty_input_roundtrips(){
        let chunk = CompressedChunk::encode(&[], ChunkParameters::shuffle(2, 5)).unwrap();
        assert!(!chunk.is_empty());
        assert_eq!(chunk.decode(0).unwrap(), ByteVec::new());
    }

    #[test]
    fn wrong_expected_size_is_invalid(){
        let bytes = half_float_bytes(100);
        let chunk = CompressedChunk::encode(&bytes, ChunkParameters::shuffle(2, 5)).unwrap();

        assert!(matches!(chunk.decode(bytes.len() - 1), Err(Error::Invalid(_))));
        assert!(matches!(chunk.decode(bytes.len() + 1), Err(Error::Invalid(_))));
    }

    #[test]
    fn damaged_chunks_are_invalid(){
        let bytes = half_float_bytes(100);
        let chunk = CompressedChunk::encode(&bytes, ChunkParameters::shuffle(2, 5)).unwrap().into_bytes();

        let mut wrong_magic = chunk.clone();
        wrong_magic[0] = b'X';
        assert!(matches!(decode_chunk(&wrong_magic, bytes.len()), Err(Error::Invalid(_))));

        let mut wrong_version = chunk.clone();
        wrong_version[4] = 2;
        assert!(matches!(decode_chunk(&wrong_version, bytes.len()), Err(Error::Invalid(_))));

        let mut wrong_flags = chunk.clone();
        wrong_flags[5] = 0b100;
        assert!(matches!(decode_chunk(&wrong_flags, bytes.len()), Err(Error::Invalid(_))));

        let mut trailing = chunk.clone();
        trailing.push(0);
        assert!(matches!(decode_chunk(&trailing, bytes.len()), Err(Error::Invalid(_))));

        assert!(matches!(decode_chunk(&chunk[.. chunk.len() - 1], bytes.len()), Err(Error::Invalid(_))));
        assert!(matches!(decode_chunk(&chunk[.. 10], bytes.len()), Err(Error::Invalid(_))));
    }

    #[test]
    fn header_describes_chunk(){
        let bytes = half_float_bytes(300);
        let chunk = CompressedChunk::encode(&bytes, ChunkParameters::shuffle(2, 4)).unwrap();
        let header = chunk.header().unwrap();

        assert_eq!(header.uncompressed_byte_size, bytes.len());
        assert_eq!(header.type_size, 2);
        assert_eq!(header.level, 4);
        assert_eq!(header.dictionary_byte_size, 0);
        assert_eq!(header.chunk_byte_size().unwrap(), chunk.len());
        assert!(chunk.len() <= max_chunk_byte_size(bytes.len()));
    }

    #[test]
    fn invalid_parameters_are_rejected(){
        assert!(matches!(CompressedChunk::encode(&[1, 2], ChunkParameters::shuffle(2, 0)), Err(Error::Configuration(_))));
        assert!(matches!(CompressedChunk::encode(&[1, 2], ChunkParameters::shuffle(2, 10)), Err(Error::Configuration(_))));
        assert!(matches!(CompressedChunk::encode(&[1, 2], ChunkParameters::shuffle(0, 5)), Err(Error::Configuration(_))));

        let parameters = ChunkParameters { type_size: 2, level: 5, algorithm: ChunkAlgorithm::TruncatedFloat };
        assert!(matches!(CompressedChunk::encode(&[1, 2], parameters), Err(Error::Configuration(_))));
    }

    #[test]
    fn library_levels(){
        let library = ensure_initialized();
        assert!(std::ptr::eq(library, ensure_initialized()));
        assert_eq!(library.zstd_level(1), 1);
        assert_eq!(library.zstd_level(5), 9);
        assert_eq!(library.zstd_level(9), *library.levels.end());

        for level in 1 ..= 9 {
            assert!(library.levels.contains(&library.zstd_level(level)));
        }
    }
}
