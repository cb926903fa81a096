// Displacement field: per-pixel (dx, dy) saying how far to look back into the
// baseline for each output pixel. Lens + ripples are accumulated here every frame.

use std::f32::consts::PI;

use crate::types::Ripple;

/// Axis-aligned pixel box, half-open: [x0, x1) x [y0, y1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl Rect {
    fn union(self, other: Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

pub struct DisplacementField {
    width: usize,
    height: usize,
    offset_x: Vec<f32>,
    offset_y: Vec<f32>,
    // union of every box written since the last clear; outside it the field is zero
    dirty: Option<Rect>,
}

/// Pixel range covered by `center ± reach` on an axis of `len` pixels.
/// Mirrors the canvas loops: lower bound floored and clamped at 0,
/// upper bound floored and clamped at `len` (exclusive).
fn span(center: f32, reach: f32, len: usize) -> Option<(usize, usize)> {
    let lo = (center - reach).floor().max(0.0);
    let hi = (center + reach).floor().min(len as f32);
    if hi <= lo {
        return None;
    }
    Some((lo as usize, hi as usize))
}

impl DisplacementField {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            offset_x: vec![0.0; width * height],
            offset_y: vec![0.0; width * height],
            dirty: None,
        }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn offset(&self, x: usize, y: usize) -> (f32, f32) {
        let idx = y * self.width + x;
        (self.offset_x[idx], self.offset_y[idx])
    }

    pub fn dirty_rect(&self) -> Option<Rect> {
        self.dirty
    }

    /// True when every offset is exactly (0, 0).
    #[cfg(test)]
    pub fn is_zero(&self) -> bool {
        self.offset_x.iter().chain(self.offset_y.iter()).all(|&v| v == 0.0)
    }

    /// Zero the field. Only the dirty box can hold non-zero values, so only it is touched.
    pub fn clear(&mut self) {
        if let Some(r) = self.dirty.take() {
            for y in r.y0..r.y1 {
                let row = y * self.width;
                self.offset_x[row + r.x0..row + r.x1].fill(0.0);
                self.offset_y[row + r.x0..row + r.x1].fill(0.0);
            }
        }
    }

    fn mark(&mut self, r: Rect) {
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(r),
            None => r,
        });
    }

    #[inline]
    fn push(&mut self, idx: usize, dx: f32, dy: f32, dist: f32, amount: f32) {
        self.offset_x[idx] += (dx / dist) * amount;
        self.offset_y[idx] += (dy / dist) * amount;
    }

    /// Lens around the pointer: radial push of `sin(dist / radius * PI) * power`,
    /// zero at the centre and at the rim, strongest half way.
    pub fn add_lens(&mut self, cx: f32, cy: f32, radius: f32, power: f32) {
        let (Some((x_min, x_max)), Some((y_min, y_max))) =
            (span(cx, radius, self.width), span(cy, radius, self.height))
        else {
            return;
        };
        self.mark(Rect { x0: x_min, y0: y_min, x1: x_max, y1: y_max });

        let r2 = radius * radius;
        for y in y_min..y_max {
            let row = y * self.width;
            let dy = y as f32 - cy;
            let dy2 = dy * dy;
            for x in x_min..x_max {
                let dx = x as f32 - cx;
                let dist2 = dx * dx + dy2;
                if dist2 > r2 { continue; }
                let dist = dist2.sqrt();
                if dist <= 0.0 { continue; } // direction undefined at the centre
                let amount = (dist / radius * PI).sin() * power;
                self.push(row + x, dx, dy, dist, amount);
            }
        }
    }

    /// One ripple ring: annulus `age ± thickness` around the (floored) ripple
    /// centre, magnitude `-sin((dist - age) / thickness * PI) * power * 0.5`.
    pub fn add_ripple(&mut self, ripple: &Ripple, thickness: f32) {
        let inner = (ripple.age - thickness).max(0.0);
        let outer = ripple.age + thickness;
        let rx = ripple.x.floor();
        let ry = ripple.y.floor();

        let (Some((x_min, x_max)), Some((y_min, y_max))) =
            (span(rx, outer, self.width), span(ry, outer, self.height))
        else {
            return;
        };
        self.mark(Rect { x0: x_min, y0: y_min, x1: x_max, y1: y_max });

        let inner2 = inner * inner;
        let outer2 = outer * outer;
        for y in y_min..y_max {
            let row = y * self.width;
            let dy = y as f32 - ry;
            let dy2 = dy * dy;
            for x in x_min..x_max {
                let dx = x as f32 - rx;
                let dist2 = dx * dx + dy2;
                if dist2 > outer2 || dist2 < inner2 { continue; }
                let dist = dist2.sqrt();
                if dist <= 0.0 { continue; }
                let phase = (dist - ripple.age) / thickness * PI;
                let amount = -phase.sin() * ripple.power * 0.5;
                self.push(row + x, dx, dy, dist, amount);
            }
        }
    }
}
