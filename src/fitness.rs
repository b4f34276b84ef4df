//! Sum of squared differences over R, G and B (alpha ignored).
//! Zero iff every pixel's color matches; symmetric in its arguments.
use rayon::prelude::*;

use crate::error::{BreedError, Result};
use crate::render::Raster;

// minimum parallel chunk: 64 KB worth of pixels keeps task overhead low on small canvases
const MIN_CHUNK_BYTES: usize = 64 * 1024;

/// distance between a rendered candidate and the target; lower is better
pub fn score(rendered: &Raster, target: &Raster) -> Result<u64> {
    profiling::scope!("fitness::score");
    if rendered.width() != target.width() || rendered.height() != target.height() {
        return Err(BreedError::InvalidState(format!(
            "rendered {}x{} does not match target {}x{}",
            rendered.width(),
            rendered.height(),
            target.width(),
            target.height()
        )));
    }
    sse_rgb(rendered.data(), target.data())
}

/// squared RGB distance of two RGBA buffers; they must be the same whole-pixel length
pub fn sse_rgb(a: &[u8], b: &[u8]) -> Result<u64> {
    if a.len() != b.len() || a.len() % 4 != 0 {
        return Err(BreedError::InvalidState(format!(
            "rgba buffers of {} and {} bytes cannot be compared",
            a.len(),
            b.len()
        )));
    }

    let num_cores = rayon::current_num_threads().max(1);
    let chunk = ((a.len() / num_cores / 4) * 4).max(MIN_CHUNK_BYTES);

    Ok(a.par_chunks(chunk)
        .zip(b.par_chunks(chunk))
        .map(|(ca, cb)| sse_rgb_scalar(ca, cb))
        .sum())
}

#[inline]
fn sse_rgb_scalar(a: &[u8], b: &[u8]) -> u64 {
    a.chunks_exact(4)
        .zip(b.chunks_exact(4))
        .map(|(pa, pb)| {
            let dr = pa[0] as i64 - pb[0] as i64;
            let dg = pa[1] as i64 - pb[1] as i64;
            let db = pa[2] as i64 - pb[2] as i64;
            (dr * dr + dg * dg + db * db) as u64
        })
        .sum()
}
