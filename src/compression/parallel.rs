//! Compress or decompress many independent blocks at once.
//! Each task uses its own compressor, and results keep the order of the inputs.

use crate::compression::{ByteVec, Bytes, Compressor};
use crate::meta::header::Header;
use crate::error::Result;

#[cfg(feature = "rayon")]
use std::sync::OnceLock;


/// A scan line block and the first row it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLineBlock<'b> {

    /// The first row of the block, in data window coordinates.
    pub origin_y: i32,

    /// The compressed or uncompressed bytes of the block.
    pub bytes: Bytes<'b>,
}

/// Compress all blocks of a layer, using all available threads.
/// Fails with the first error in input order.
pub fn compress_blocks(header: &Header, blocks: &[ScanLineBlock<'_>]) -> Result<Vec<ByteVec>> {
    let prototype = Compressor::new(header)?;

    run_in_pool(blocks, |block| {
        let mut compressor = prototype.clone();
        compressor.compress(block.bytes, block.origin_y).map(<[u8]>::to_vec)
    })
}

/// Decompress all blocks of a layer, using all available threads.
/// Fails with the first error in input order.
pub fn uncompress_blocks(header: &Header, blocks: &[ScanLineBlock<'_>]) -> Result<Vec<ByteVec>> {
    let prototype = Compressor::new(header)?;

    run_in_pool(blocks, |block| {
        let mut compressor = prototype.clone();
        compressor.uncompress(block.bytes, block.origin_y).map(<[u8]>::to_vec)
    })
}

fn run_in_pool<'b, F>(blocks: &[ScanLineBlock<'b>], process: F) -> Result<Vec<ByteVec>>
    where F: Fn(ScanLineBlock<'b>) -> Result<ByteVec> + Send + Sync
{
    let blocks = blocks.to_vec();

    #[cfg(feature = "rayon")] {
        if let Some(pool) = block_pool() {
            return pool.install(|| map_in_parallel(blocks, process))
                .into_iter().collect();
        }
    }

    blocks.into_iter().map(process).collect()
}

/// The thread pool shared by all block compression calls.
/// Built on first use. Is `None` if no pool can be built.
#[cfg(feature = "rayon")]
fn block_pool() -> Option<&'static rayon_core::ThreadPool> {
    static BLOCK_POOL: OnceLock<Option<rayon_core::ThreadPool>> = OnceLock::new();

    BLOCK_POOL.get_or_init(|| {
        let maybe_pool = rayon_core::ThreadPoolBuilder::new()
            .thread_name(|index| format!("OpenEXR Block Compressor Thread #{}", index))
            .build();

        match maybe_pool {
            Ok(pool) => Some(pool),

            // in case thread pool creation fails (for example on WASM currently),
            // we revert to sequential compression
            Err(error) => {
                log::debug!("compressing sequentially, no thread pool available ({})", error);
                None
            },
        }
    }).as_ref()
}


/// Apply the function to all inputs concurrently, returning the outputs in input order.
/// Uses the current rayon thread pool, or the global one outside of any pool.
#[cfg(feature = "rayon")]
pub(crate) fn map_in_parallel<I, O, F>(inputs: Vec<I>, map: F) -> Vec<O>
    where I: Send, O: Send, F: Fn(I) -> O + Sync
{
    if inputs.len() < 2 {
        return inputs.into_iter().map(map).collect();
    }

    let mut slots: Vec<Option<O>> = inputs.iter().map(|_| None).collect();
    let map = &map;

    rayon_core::scope(|scope| {
        for (input, slot) in inputs.into_iter().zip(slots.iter_mut()) {
            scope.spawn(move |_| *slot = Some(map(input)));
        }
    });

    // a task that panicked propagated its panic out of the scope, so all slots are filled
    slots.into_iter().flatten().collect()
}

/// Apply the function to all inputs, returning the outputs in input order.
#[cfg(not(feature = "rayon"))]
pub(crate) fn map_in_parallel<I, O, F>(inputs: Vec<I>, map: F) -> Vec<O>
    where F: Fn(I) -> O
{
    inputs.into_iter().map(map).collect()
}
