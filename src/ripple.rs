// Ripples + cursor history.
// Visual outcomes:
// - Moving the mouse drops a ripple every few pixels; each ring grows and fades.
// - At most `max` rings live at once; the oldest one vanishes first.

use std::collections::VecDeque;

use crate::types::Ripple;

/// Bounded FIFO of live ripples.
pub struct RippleSet {
    ripples: VecDeque<Ripple>,
    max: usize,
}

impl RippleSet {
    pub fn new(max: usize) -> Self {
        Self { ripples: VecDeque::with_capacity(max), max }
    }

    pub fn len(&self) -> usize { self.ripples.len() }
    pub fn is_empty(&self) -> bool { self.ripples.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Ripple> {
        self.ripples.iter()
    }

    /// Add a ripple, dropping the oldest one if we're at the cap.
    pub fn push(&mut self, ripple: Ripple) {
        if self.max == 0 { return; }
        while self.ripples.len() >= self.max {
            self.ripples.pop_front();
        }
        self.ripples.push_back(ripple);
    }

    /// Grow every ring by `speed` and weaken it by `decay`; spent rings are removed.
    pub fn advance(&mut self, speed: f32, decay: f32) {
        for r in self.ripples.iter_mut() {
            r.age += speed;
            r.power -= decay;
        }
        self.ripples.retain(Ripple::alive);
    }

    /// Scale every ripple centre (used when the canvas is resized).
    pub fn rescale(&mut self, sx: f32, sy: f32) {
        for r in self.ripples.iter_mut() {
            r.x *= sx;
            r.y *= sy;
        }
    }

    pub fn clear(&mut self) {
        self.ripples.clear();
    }
}

/// Where the pointer is now, and where the last ripple was dropped.
/// `None` = pointer outside the canvas (or never seen).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CursorState {
    pub current: Option<(f32, f32)>,
    pub last_spawn: Option<(f32, f32)>,
}

impl CursorState {
    /// Record a pointer position in field space. Negative coordinates count as "outside".
    pub fn move_to(&mut self, x: f32, y: f32) {
        self.current = if x < 0.0 || y < 0.0 { None } else { Some((x, y)) };
    }

    pub fn leave(&mut self) {
        self.current = None;
    }

    pub fn is_inside(&self) -> bool {
        self.current.is_some()
    }

    /// Decide whether the pointer travelled far enough to drop a new ripple.
    /// The first position seen only arms the tracker.
    pub fn take_spawn(&mut self, threshold: f32) -> Option<(f32, f32)> {
        let (x, y) = self.current?;
        let Some((lx, ly)) = self.last_spawn else {
            self.last_spawn = Some((x, y));
            return None;
        };
        let (dx, dy) = (x - lx, y - ly);
        if (dx * dx + dy * dy).sqrt() > threshold {
            self.last_spawn = Some((x, y));
            Some((x, y))
        } else {
            None
        }
    }

    pub fn rescale(&mut self, sx: f32, sy: f32) {
        self.current = self.current.map(|(x, y)| (x * sx, y * sy));
        self.last_spawn = self.last_spawn.map(|(x, y)| (x * sx, y * sy));
    }
}
