// Loads the picture off the window thread and turns it into the baseline raster.
// Visual expectation: the window shows plain background until `poll()` hands back
// the decoded picture, then the picture appears centred on the background.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use image::{imageops, imageops::FilterType, RgbaImage};
use tracing::debug;

use crate::error::Error;
use crate::types::{pack_argb, unpack_argb, FrameBuffer};

/// Decode a picture file into RGBA8. Blocks.
pub fn decode(path: &Path) -> Result<RgbaImage, Error> {
    let img = image::open(path).map_err(|e| Error::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(img.to_rgba8())
}

/// A decode running on a helper thread. Yields its result exactly once.
pub struct ImageLoad {
    path: PathBuf,
    rx: Option<Receiver<Result<RgbaImage, Error>>>,
}

impl ImageLoad {
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::channel();
        let worker_path = path.clone();
        thread::spawn(move || {
            // receiver gone = window closed before we finished; nothing to do
            let _ = tx.send(decode(&worker_path));
        });
        debug!(path = %path.display(), "image decode started");
        Self { path, rx: Some(rx) }
    }

    /// Non-blocking check. `Some` once (success or failure), `None` before and after.
    pub fn poll(&mut self) -> Option<Result<RgbaImage, Error>> {
        let rx = self.rx.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(Error::ImageLoad {
                path: self.path.clone(),
                reason: "decoder thread exited without a result".into(),
            }),
        };
        self.rx = None;
        Some(result)
    }
}

/// Source-over blend of one RGBA pixel onto an opaque background pixel.
#[inline]
fn blend_over(dst: u32, src: [u8; 4]) -> u32 {
    let [sr, sg, sb, sa] = src;
    if sa == 255 { return pack_argb(sr, sg, sb, 255); }
    if sa == 0 { return dst; }
    let [dr, dg, db, _] = unpack_argb(dst);
    let a = sa as u32;
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * (255 - a) + 127) / 255) as u8;
    pack_argb(mix(sr, dr), mix(sg, dg), mix(sb, db), 255)
}

/// Build the undistorted baseline: background fill with `image` scaled by
/// `scale` and centred. Parts hanging off the raster are cut off.
pub fn compose_baseline(
    image: &RgbaImage,
    width: usize,
    height: usize,
    scale: f32,
    background: u32,
) -> FrameBuffer {
    let mut fb = FrameBuffer::filled(width, height, background);

    let w = image.width() as f32 * scale;
    let h = image.height() as f32 * scale;
    let (dw, dh) = (w.round() as u32, h.round() as u32);
    if dw == 0 || dh == 0 || width == 0 || height == 0 {
        return fb;
    }

    // top-left corner so the picture sits in the middle (may be negative)
    let x0 = (width as f32 / 2.0 - w / 2.0).round() as i64;
    let y0 = (height as f32 / 2.0 - h / 2.0).round() as i64;

    let scaled = imageops::resize(image, dw, dh, FilterType::Triangle);
    for (sx, sy, px) in scaled.enumerate_pixels() {
        let tx = x0 + sx as i64;
        let ty = y0 + sy as i64;
        if tx < 0 || ty < 0 || tx >= width as i64 || ty >= height as i64 { continue; }
        let idx = ty as usize * width + tx as usize;
        fb.pixels[idx] = blend_over(fb.pixels[idx], px.0);
    }
    fb
}
