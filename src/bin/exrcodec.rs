//! Command line client to inspect the registered codecs
//! and to compress raw single-layer scan line data.
//!
//! Raw input contains the samples of all blocks, row by row,
//! and within each row channel by channel, in alphabetical channel order.
//! Compressed output contains each block as an `i32` byte size followed by the bytes.

use std::convert::TryFrom;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};

use exr_codecs::prelude::*;
use exr_codecs::compression::registry::{self, CODECS};
use exr_codecs::io::Data;


#[derive(Parser)]
#[command(name = "exrcodec", about = "Compress and decompress OpenEXR pixel blocks", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print all registered compression methods
    List,

    /// Print the properties of a single compression method
    Info {
        /// Name of the compression method, for example `zip` or `zstd`
        name: String,
    },

    /// Compress raw scan lines into a sequence of size-prefixed blocks
    Compress {
        #[command(flatten)]
        layer: LayerArgs,

        /// Raw pixel data
        input: PathBuf,

        /// Destination of the compressed blocks
        output: PathBuf,
    },

    /// Decompress a sequence of size-prefixed blocks into raw scan lines
    Decompress {
        #[command(flatten)]
        layer: LayerArgs,

        /// Compressed blocks, as written by `compress`
        input: PathBuf,

        /// Destination of the raw pixel data
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct LayerArgs {
    /// Compression method
    #[arg(short, long, default_value = "zip")]
    codec: String,

    /// Width of the layer in pixels
    #[arg(long)]
    width: usize,

    /// Height of the layer in pixels
    #[arg(long)]
    height: usize,

    /// Channel as `name:type`, where type is `half`, `float` or `uint`. Repeat for more channels
    #[arg(long = "channel", required = true)]
    channels: Vec<String>,

    /// Zstd level between 1 and 9, stored in the layer instead of the process default
    #[arg(long)]
    zstd_level: Option<u8>,
}


fn main() -> anyhow::Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Commands::List => run_list(),
        Commands::Info { name } => run_info(&name),
        Commands::Compress { layer, input, output } => run_compress(&layer, input, output),
        Commands::Decompress { layer, input, output } => run_decompress(&layer, input, output),
    }
}

fn run_list() -> anyhow::Result<()> {
    for codec in CODECS.iter() {
        println!(
            "{:>2}  {:<40}  {:>3} lines{}{}",
            codec.id, codec.long_description(), codec.scan_lines,
            if codec.lossy { ", lossy" } else { "" },
            if codec.deep { ", deep" } else { "" },
        );
    }

    Ok(())
}

fn run_info(name: &str) -> anyhow::Result<()> {
    let codec = registry::lookup_by_name(name)
        .ok_or_else(|| anyhow!("unknown compression method \"{}\" (expected one of {})", name, registry::all_names(", ")))?;

    let compression = Compression::from_id(codec.id)?;

    println!("{}", codec.long_description());
    println!("id: {}", codec.id);
    println!("scan lines per block: {}", codec.scan_lines);
    println!("lossy: {}", codec.lossy);
    println!("deep data: {}", codec.deep);

    let lossless_types: Vec<String> = [SampleType::F16, SampleType::F32, SampleType::U32].iter()
        .filter(|&&sample_type| compression.is_lossless_for(sample_type))
        .map(SampleType::to_string)
        .collect();

    println!("lossless for: {}", if lossless_types.is_empty() { "-".to_string() } else { lossless_types.join(", ") });
    Ok(())
}

fn run_compress(layer: &LayerArgs, input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let header = layer.header()?;
    let raw = fs::read(&input).with_context(|| format!("reading {:?}", input))?;

    let expected_byte_size = header.channels.byte_size_of(header.data_window)?;
    if raw.len() != expected_byte_size {
        bail!("{:?} contains {} bytes, but the layer requires {} bytes", input, raw.len(), expected_byte_size);
    }

    let mut blocks = Vec::new();
    let mut remaining = raw.as_slice();

    for origin_y in block_origins(&header) {
        let byte_size = header.channels.byte_size_of(block_bounds(&header, origin_y))?;
        let (bytes, rest) = remaining.split_at(byte_size);
        blocks.push(ScanLineBlock { origin_y, bytes });
        remaining = rest;
    }

    let compressed = compress_blocks(&header, &blocks)?;

    let mut file = Vec::new();
    for block in &compressed {
        u8::write_i32_sized_slice(&mut file, block)?;
    }

    fs::write(&output, &file).with_context(|| format!("writing {:?}", output))?;
    log::info!("compressed {} bytes into {} blocks of {} bytes in total", raw.len(), compressed.len(), file.len());
    Ok(())
}

fn run_decompress(layer: &LayerArgs, input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let header = layer.header()?;
    let file = fs::read(&input).with_context(|| format!("reading {:?}", input))?;

    let mut blocks = Vec::new();
    let mut remaining = file.as_slice();

    for origin_y in block_origins(&header) {
        let byte_size = i32::read(&mut remaining).context("reading block size")?;
        let byte_size = usize::try_from(byte_size).map_err(|_| anyhow!("negative block size {}", byte_size))?;

        if byte_size > remaining.len() {
            bail!("block at y = {} is truncated", origin_y);
        }

        let (bytes, rest) = remaining.split_at(byte_size);
        blocks.push(ScanLineBlock { origin_y, bytes });
        remaining = rest;
    }

    if !remaining.is_empty() {
        bail!("{} unexpected bytes after the last block", remaining.len());
    }

    let raw = uncompress_blocks(&header, &blocks)?.concat();
    fs::write(&output, &raw).with_context(|| format!("writing {:?}", output))?;
    log::info!("decompressed {} blocks into {} bytes", blocks.len(), raw.len());
    Ok(())
}


impl LayerArgs {
    fn header(&self) -> anyhow::Result<Header> {
        let compression: Compression = self.codec.parse()?;

        let mut channels = self.channels.iter()
            .map(|argument| parse_channel(argument))
            .collect::<anyhow::Result<Vec<ChannelDescription>>>()?;

        channels.sort_by(|a, b| a.name.cmp(&b.name));

        let channels = ChannelList::new(channels.into_iter().collect());
        let data_window = IntegerBounds::from_dimensions((self.width, self.height));

        let mut header = Header::new(channels, data_window, compression);
        if let Some(level) = self.zstd_level {
            header = header.with_zstd_compression_level(level);
        }

        header.validate()?;
        Ok(header)
    }
}

fn parse_channel(argument: &str) -> anyhow::Result<ChannelDescription> {
    let (name, sample_type) = argument.split_once(':')
        .ok_or_else(|| anyhow!("channel \"{}\" is not of the form name:type", argument))?;

    let sample_type = match sample_type {
        "half" => SampleType::F16,
        "float" => SampleType::F32,
        "uint" => SampleType::U32,
        other => bail!("unknown sample type \"{}\" (expected half, float or uint)", other),
    };

    Ok(ChannelDescription::new(name, sample_type, false))
}

fn block_origins(header: &Header) -> impl Iterator<Item = i32> {
    let start = header.data_window.position.y();
    let lines = header.compression.scan_lines_per_block();
    let block_count = (header.data_window.size.height() + lines - 1) / lines;

    (0 .. block_count).map(move |index| start + (index * lines) as i32)
}

fn block_bounds(header: &Header, origin_y: i32) -> IntegerBounds {
    let window = header.data_window;
    let offset = (origin_y - window.position.y()) as usize;
    let height = (window.size.height() - offset).min(header.compression.scan_lines_per_block());

    IntegerBounds::new(Vec2(window.position.x(), origin_y), Vec2(window.size.width(), height))
}
