#[macro_use]
extern crate bencher;

extern crate exr_codecs;
use exr_codecs::prelude::*;
use exr_codecs::io::Data;

use bencher::Bencher;


fn gradient_layer(compression: Compression) -> (Header, ByteVec) {
    let channels = ChannelList::new(smallvec::smallvec![
        ChannelDescription::new("B", SampleType::F16, true),
        ChannelDescription::new("G", SampleType::F16, true),
        ChannelDescription::new("R", SampleType::F16, true),
    ]);

    let lines = compression.scan_lines_per_block();
    let header = Header::new(channels, IntegerBounds::from_dimensions((1024, lines)), compression);

    let samples: Vec<f16> = (0 .. 1024 * lines * 3)
        .map(|index| f16::from_f32(((index % 1024) as f32 / 1024.0).powf(2.2)))
        .collect();

    let mut bytes = ByteVec::new();
    f16::write_slice(&mut bytes, &samples).unwrap();
    (header, bytes)
}

fn compress_block(bench: &mut Bencher, compression: Compression) {
    let (header, bytes) = gradient_layer(compression);
    let mut compressor = Compressor::new(&header).unwrap();

    bench.iter(||{
        let compressed = compressor.compress(&bytes, 0).unwrap();
        bencher::black_box(compressed.len());
    })
}

fn uncompress_block(bench: &mut Bencher, compression: Compression) {
    let (header, bytes) = gradient_layer(compression);
    let mut compressor = Compressor::new(&header).unwrap();
    let compressed = compressor.compress(&bytes, 0).unwrap().to_vec();

    bench.iter(||{
        let decompressed = compressor.uncompress(&compressed, 0).unwrap();
        bencher::black_box(decompressed.len());
    })
}

fn compress_rle(bench: &mut Bencher) { compress_block(bench, Compression::RLE) }
fn compress_zip(bench: &mut Bencher) { compress_block(bench, Compression::ZIP16) }
fn compress_zstd(bench: &mut Bencher) { compress_block(bench, Compression::ZSTD) }

fn uncompress_rle(bench: &mut Bencher) { uncompress_block(bench, Compression::RLE) }
fn uncompress_zip(bench: &mut Bencher) { uncompress_block(bench, Compression::ZIP16) }
fn uncompress_zstd(bench: &mut Bencher) { uncompress_block(bench, Compression::ZSTD) }

fn compress_deep_samples(bench: &mut Bencher) {
    let channels = ChannelList::new(smallvec::smallvec![
        ChannelDescription::new("A", SampleType::F16, true),
        ChannelDescription::new("Z", SampleType::F32, false),
    ]);

    let header = Header::new(channels, IntegerBounds::from_dimensions((1024, 1)), Compression::ZSTD).with_deep_data();
    let pixel_offsets: Vec<i32> = (1 ..= 1024).map(|pixel| pixel * 4).collect();

    let mut sample_data = ByteVec::new();
    let alpha: Vec<f16> = (0 .. 4096).map(|index| f16::from_f32((index % 4) as f32 * 0.25)).collect();
    let depth: Vec<f32> = (0 .. 4096).map(|index| 10.0 + index as f32 * 0.01).collect();
    f16::write_slice(&mut sample_data, &alpha).unwrap();
    f32::write_slice(&mut sample_data, &depth).unwrap();

    let mut compressor = DeepCompressor::new(&header).unwrap();

    bench.iter(||{
        let envelope = compressor.compress(DeepSamples { sample_data: &sample_data, pixel_offsets: &pixel_offsets }).unwrap();
        bencher::black_box(envelope.len());
    })
}

benchmark_group!(compression,
    compress_rle,
    compress_zip,
    compress_zstd,
    uncompress_rle,
    uncompress_zip,
    uncompress_zstd,
    compress_deep_samples
);

benchmark_main!(compression);
