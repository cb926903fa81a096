// Resampling: build the visible frame by looking each pixel up in the baseline,
// shifted by the displacement field. Nearest-neighbour, edge-clamped.

use crate::error::Error;
use crate::field::DisplacementField;
use crate::types::FrameBuffer;

/// Read the baseline at (sx, sy) after flooring and clamping to the raster.
/// Visual: pixels pulled from "outside" the picture repeat the nearest edge.
#[inline]
pub fn sample_clamped(baseline: &FrameBuffer, sx: f32, sy: f32) -> u32 {
    let max_x = baseline.width.saturating_sub(1) as f32;
    let max_y = baseline.height.saturating_sub(1) as f32;
    // f32 -> usize saturates NaN/negatives to 0
    let x = sx.floor().clamp(0.0, max_x) as usize;
    let y = sy.floor().clamp(0.0, max_y) as usize;
    baseline.get(x, y)
}

/// Write `baseline` distorted by `field` into `out`.
/// Zero-offset pixels are copied straight across; everything else is
/// fetched from `(x - ox, y - oy)`.
pub fn resample(
    baseline: &FrameBuffer,
    field: &DisplacementField,
    out: &mut FrameBuffer,
) -> Result<(), Error> {
    if !baseline.same_size(out) {
        return Err(Error::SizeMismatch("resample: baseline vs output".into()));
    }
    if field.width() != baseline.width || field.height() != baseline.height {
        return Err(Error::SizeMismatch("resample: field vs baseline".into()));
    }

    // Fast path for the whole frame; the field is zero outside its dirty box.
    out.pixels.copy_from_slice(&baseline.pixels);

    let Some(r) = field.dirty_rect() else { return Ok(()) };
    for y in r.y0..r.y1 {
        let row = y * out.width;
        for x in r.x0..r.x1 {
            let (ox, oy) = field.offset(x, y);
            if ox == 0.0 && oy == 0.0 { continue; }
            out.pixels[row + x] = sample_clamped(baseline, x as f32 - ox, y as f32 - oy);
        }
    }
    Ok(())
}
