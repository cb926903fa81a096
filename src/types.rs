// Core types shared by the field, the resampler and the renderer.

/// Pack four channels as 0xAARRGGBB. minifb ignores the top byte,
/// so the same buffer can go straight to the window.
#[inline]
pub fn pack_argb(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Inverse of `pack_argb`, returned as [r, g, b, a].
#[inline]
pub fn unpack_argb(px: u32) -> [u8; 4] {
    [
        ((px >> 16) & 0xFF) as u8,
        ((px >> 8) & 0xFF) as u8,
        (px & 0xFF) as u8,
        ((px >> 24) & 0xFF) as u8,
    ]
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the raster is (internal pixels)
    pub height: usize,     // how tall the raster is (internal pixels)
    pub pixels: Vec<u32>,  // each entry is 0xAARRGGBB
}

impl FrameBuffer {
    /// A raster of `width * height` pixels, all set to `color`.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    pub fn same_size(&self, other: &FrameBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// One expanding wave left behind by the pointer.
/// `age` doubles as the current radius in field pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ripple {
    pub x: f32,
    pub y: f32,
    pub age: f32,
    pub power: f32,
}

impl Ripple {
    pub fn new(x: f32, y: f32, power: f32) -> Self {
        Self { x, y, age: 0.0, power }
    }

    #[inline]
    pub fn alive(&self) -> bool {
        self.power > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_unpack_agree() {
        let px = pack_argb(255, 10, 20, 128);
        assert_eq!(px, 0x80_FF_0A_14);
        assert_eq!(unpack_argb(px), [255, 10, 20, 128]);
    }

    #[test]
    fn filled_buffer_has_every_pixel_set() {
        let fb = FrameBuffer::filled(4, 3, 0xFF_00_00_FF);
        assert_eq!(fb.pixels.len(), 12);
        assert!(fb.pixels.iter().all(|&p| p == 0xFF_00_00_FF));
        assert_eq!(fb.get(3, 2), 0xFF_00_00_FF);
    }

    #[test]
    fn ripple_dies_when_power_reaches_zero() {
        let mut r = Ripple::new(1.0, 2.0, 0.5);
        assert!(r.alive());
        r.power -= 0.5;
        assert!(!r.alive());
    }
}
