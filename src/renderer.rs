// The water renderer: owns every bit of frame-to-frame state and turns
// (baseline, cursor, ripples) into the frame you see.
//
// Per animated frame:
//   clear field -> age ripples -> maybe drop a ripple -> (idle? copy baseline)
//   -> lens -> ripple rings -> resample
//
// Loop lifecycle follows the `animated` flag only; there is no restart-on-click.

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::config::{Config, EffectConfig, ResizePolicy};
use crate::error::Error;
use crate::field::DisplacementField;
use crate::resample::resample;
use crate::ripple::{CursorState, RippleSet};
use crate::schedule::FrameLoop;
use crate::source::compose_baseline;
use crate::types::{FrameBuffer, Ripple};

/// Effect constants in internal-buffer pixels (already scaled by resolution).
#[derive(Clone, Debug, PartialEq)]
pub struct EffectParams {
    pub lens_radius: f32,
    pub lens_power: f32,
    pub ripple_speed: f32,
    pub ripple_decay: f32,
    pub ripple_thickness: f32,
    pub spawn_distance: f32,
    pub ripple_power: f32,
    pub max_ripples: usize,
    pub image_scale: f32,
    pub resize_policy: ResizePolicy,
}

impl EffectParams {
    pub fn from_config(effect: &EffectConfig, resolution: f32) -> Self {
        Self {
            lens_radius: effect.lens_radius * resolution,
            lens_power: effect.lens_power,
            ripple_speed: effect.ripple_speed * resolution,
            ripple_decay: effect.ripple_decay,
            ripple_thickness: effect.ripple_thickness * resolution,
            spawn_distance: effect.spawn_distance * resolution,
            ripple_power: effect.ripple_power,
            max_ripples: effect.max_ripples,
            image_scale: effect.image_scale,
            resize_policy: effect.resize_policy,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub resolution: f32,
    pub background: u32,
    pub animated: bool,
}

/// Everything that survives from one frame to the next.
pub struct RendererState {
    pub baseline: FrameBuffer,
    pub field: DisplacementField,
    pub ripples: RippleSet,
    pub cursor: CursorState,
}

impl RendererState {
    pub fn new(baseline: FrameBuffer, max_ripples: usize) -> Self {
        let field = DisplacementField::new(baseline.width, baseline.height);
        Self {
            baseline,
            field,
            ripples: RippleSet::new(max_ripples),
            cursor: CursorState::default(),
        }
    }
}

/// What a frame step ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// Nothing to distort: baseline copied as-is
    Idle,
    Distorted,
}

/// Run one animated frame into `out`.
pub fn step(
    state: &mut RendererState,
    params: &EffectParams,
    out: &mut FrameBuffer,
) -> Result<FrameKind, Error> {
    if !state.baseline.same_size(out) {
        return Err(Error::SizeMismatch("step: baseline vs output".into()));
    }

    /* 1) Fresh field, older ripples */
    state.field.clear();
    state.ripples.advance(params.ripple_speed, params.ripple_decay);

    /* 2) Drop a ripple if the pointer travelled far enough */
    if let Some((x, y)) = state.cursor.take_spawn(params.spawn_distance) {
        let (w, h) = (state.baseline.width as f32, state.baseline.height as f32);
        if x <= w && y <= h {
            state.ripples.push(Ripple::new(x, y, params.ripple_power));
        }
    }

    /* 3) Idle: no rings, pointer away -> plain copy */
    if state.ripples.is_empty() && !state.cursor.is_inside() {
        out.pixels.copy_from_slice(&state.baseline.pixels);
        return Ok(FrameKind::Idle);
    }

    /* 4) Accumulate lens + rings, then resample */
    if let Some((cx, cy)) = state.cursor.current {
        state.field.add_lens(cx, cy, params.lens_radius, params.lens_power);
    }
    for r in state.ripples.iter() {
        state.field.add_ripple(r, params.ripple_thickness);
    }
    resample(&state.baseline, &state.field, out)?;
    Ok(FrameKind::Distorted)
}

/// Internal buffer size for a window of `viewport` pixels. Never zero.
pub fn scaled_size(viewport: (usize, usize), resolution: f32) -> (usize, usize) {
    let w = (viewport.0 as f32 * resolution) as usize;
    let h = (viewport.1 as f32 * resolution) as usize;
    (w.max(1), h.max(1))
}

/// Controller: owns the state, the frame loop and the presented frame.
pub struct WaterRenderer {
    settings: Settings,
    params: EffectParams,
    viewport: (usize, usize),
    size: (usize, usize),
    image: Option<RgbaImage>,
    state: Option<RendererState>,
    frames: FrameLoop,
    output: FrameBuffer,
}

impl WaterRenderer {
    /// Until an image arrives the frame is plain background.
    pub fn new(settings: Settings, params: EffectParams, viewport: (usize, usize)) -> Self {
        let size = scaled_size(viewport, settings.resolution);
        Self {
            settings,
            params,
            viewport,
            size,
            image: None,
            state: None,
            frames: FrameLoop::new(),
            output: FrameBuffer::filled(size.0, size.1, settings.background),
        }
    }

    pub fn from_config(config: &Config, viewport: (usize, usize)) -> Result<Self, Error> {
        config.validate()?;
        let settings = Settings {
            resolution: config.display.resolution,
            background: config.background()?,
            animated: config.display.animated,
        };
        let params = EffectParams::from_config(&config.effect, settings.resolution);
        Ok(Self::new(settings, params, viewport))
    }

    pub fn frame(&self) -> &FrameBuffer { &self.output }
    pub fn is_animated(&self) -> bool { self.settings.animated }
    pub fn is_loaded(&self) -> bool { self.state.is_some() }
    pub fn internal_size(&self) -> (usize, usize) { self.size }

    pub fn ripple_count(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.ripples.len())
    }

    fn baseline(&self, image: &RgbaImage) -> FrameBuffer {
        compose_baseline(
            image,
            self.size.0,
            self.size.1,
            self.settings.resolution * self.params.image_scale,
            self.settings.background,
        )
    }

    /// Result of the image decode. Success builds the baseline and starts the
    /// loop (or draws one clean frame when static); failure leaves the background.
    pub fn image_loaded(&mut self, result: Result<RgbaImage, Error>) {
        self.frames.cancel();
        match result {
            Ok(image) => {
                info!(width = image.width(), height = image.height(), "image loaded");
                let baseline = self.baseline(&image);
                self.output = baseline.clone();
                self.state = Some(RendererState::new(baseline, self.params.max_ripples));
                self.image = Some(image);
                if self.settings.animated {
                    self.frames.request();
                    debug!("frame loop started");
                }
            }
            Err(e) => {
                warn!(error = %e, "image failed to load; showing background only");
                self.image = None;
                self.state = None;
                self.output = FrameBuffer::filled(self.size.0, self.size.1, self.settings.background);
            }
        }
    }

    /// Pointer position in window pixels.
    pub fn pointer_moved(&mut self, screen_x: f32, screen_y: f32) {
        if !self.settings.animated { return; }
        let res = self.settings.resolution;
        if let Some(state) = self.state.as_mut() {
            state.cursor.move_to(screen_x * res, screen_y * res);
        }
    }

    pub fn pointer_left(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.cursor.leave();
        }
    }

    /// New window size. Buffers and baseline are rebuilt; live ripples follow `resize_policy`.
    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == self.viewport || width == 0 || height == 0 { return; }
        let old = self.size;
        self.viewport = (width, height);
        self.size = scaled_size(self.viewport, self.settings.resolution);
        debug!(?old, new = ?self.size, "resizing internal buffers");

        let Some(image) = self.image.as_ref() else {
            self.output = FrameBuffer::filled(self.size.0, self.size.1, self.settings.background);
            return;
        };
        let baseline = self.baseline(image);
        self.output = baseline.clone();

        if let Some(state) = self.state.as_mut() {
            state.field = DisplacementField::new(baseline.width, baseline.height);
            state.baseline = baseline;
            match self.params.resize_policy {
                ResizePolicy::Rescale => {
                    let sx = self.size.0 as f32 / old.0 as f32;
                    let sy = self.size.1 as f32 / old.1 as f32;
                    state.ripples.rescale(sx, sy);
                    state.cursor.rescale(sx, sy);
                }
                ResizePolicy::Clear => {
                    state.ripples.clear();
                    state.cursor = CursorState::default();
                }
            }
        }
    }

    /// Toggle the interactive loop. Any pending frame is cancelled first, so
    /// flipping this quickly never stacks requests. A real change of the flag
    /// starts the water from scratch: no ripples, no cursor history.
    pub fn set_animated(&mut self, animated: bool) {
        self.frames.cancel();
        if animated != self.settings.animated {
            if let Some(state) = self.state.as_mut() {
                state.field.clear();
                state.ripples.clear();
                state.cursor = CursorState::default();
            }
        }
        self.settings.animated = animated;
        if animated {
            if self.state.is_some() {
                self.frames.request();
                debug!("frame loop started");
            }
        } else {
            self.render_clean();
            debug!("frame loop stopped");
        }
    }

    /// Show the undistorted baseline (or background if there is none).
    pub fn render_clean(&mut self) {
        match self.state.as_ref() {
            Some(state) => self.output.pixels.copy_from_slice(&state.baseline.pixels),
            None => self.output.pixels.fill(self.settings.background),
        }
    }

    /// Run the pending frame, if there is one, and queue the next while animated.
    /// Returns whether a frame was rendered.
    pub fn tick(&mut self) -> Result<bool, Error> {
        if self.frames.take_due().is_none() { return Ok(false); }
        if !self.settings.animated { return Ok(false); }
        let Some(state) = self.state.as_mut() else { return Ok(false) };

        step(state, &self.params, &mut self.output)?;
        self.frames.request();
        Ok(true)
    }

    /// Stop scheduling frames for good (window closing).
    pub fn shutdown(&mut self) {
        let had_pending = self.frames.cancel();
        let (issued, cancelled) = self.frames.stats();
        debug!(had_pending, issued, cancelled, "renderer shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{pack_argb, unpack_argb};
    use image::Rgba;

    const RED: u32 = 0xFF_FF_00_00;
    const BG: u32 = 0xFF_0A_0C_12;

    fn params(resolution: f32) -> EffectParams {
        EffectParams::from_config(&EffectConfig::default(), resolution)
    }

    fn gradient(w: usize, h: usize) -> FrameBuffer {
        let mut fb = FrameBuffer::filled(w, h, 0);
        for y in 0..h {
            for x in 0..w {
                fb.pixels[y * w + x] = pack_argb((x * 4) as u8, (y * 4) as u8, 90, 255);
            }
        }
        fb
    }

    fn picture() -> RgbaImage {
        RgbaImage::from_fn(200, 100, |x, y| Rgba([(x % 256) as u8, (y * 2) as u8, 50, 255]))
    }

    fn renderer(animated: bool) -> WaterRenderer {
        let settings = Settings { resolution: 0.5, background: BG, animated };
        WaterRenderer::new(settings, params(0.5), (200, 100))
    }

    fn loaded(animated: bool) -> WaterRenderer {
        let mut r = renderer(animated);
        r.image_loaded(Ok(picture()));
        r
    }

    fn baseline_of(r: &WaterRenderer) -> FrameBuffer {
        r.state.as_ref().map(|s| s.baseline.clone()).expect("image loaded")
    }

    #[test]
    fn params_scale_with_resolution() {
        let p = params(0.4);
        assert!((p.lens_radius - 24.0).abs() < 1e-5);
        assert!((p.ripple_speed - 1.6).abs() < 1e-5);
        assert!((p.ripple_thickness - 16.0).abs() < 1e-5);
        assert!((p.spawn_distance - 2.0).abs() < 1e-5);
        assert_eq!(p.lens_power, 5.0);
        assert_eq!(p.ripple_power, 10.0);
    }

    #[test]
    fn scaled_size_truncates_and_never_hits_zero() {
        assert_eq!(scaled_size((1280, 720), 0.4), (512, 288));
        assert_eq!(scaled_size((3, 2), 0.1), (1, 1));
    }

    #[test]
    fn red_square_ripple_scenario() {
        let p = params(0.4);
        let mut state = RendererState::new(FrameBuffer::filled(10, 10, RED), p.max_ripples);
        state.ripples.push(Ripple::new(5.0, 5.0, 10.0));
        let mut out = FrameBuffer::filled(10, 10, 0);

        let kind = step(&mut state, &p, &mut out).expect("sizes match");
        assert_eq!(kind, FrameKind::Distorted);

        let r = state.ripples.iter().next().copied().expect("ripple still alive");
        assert!((r.age - p.ripple_speed).abs() < 1e-6);
        assert_eq!(r.power, 9.5);

        // the centre has no direction and stays put
        assert_eq!(state.field.offset(5, 5), (0.0, 0.0));
        assert_eq!(out.get(5, 5), RED);
        // ring pixels really are displaced...
        assert_ne!(state.field.offset(8, 5), (0.0, 0.0));
        // ...but only ever pick up opaque baseline colours
        assert!(out.pixels.iter().all(|&px| px == RED));
    }

    #[test]
    fn ripple_samples_from_elsewhere() {
        let p = params(0.4);
        let base = gradient(10, 10);
        let mut state = RendererState::new(base.clone(), p.max_ripples);
        state.ripples.push(Ripple::new(5.0, 5.0, 10.0));
        let mut out = FrameBuffer::filled(10, 10, 0);
        step(&mut state, &p, &mut out).expect("sizes match");

        // dist 3 past a crest at 1.6: pulled inward by ~1.29px, so it shows x = 9
        assert_eq!(out.get(8, 5), base.get(9, 5));
        assert_eq!(out.get(5, 5), base.get(5, 5));
        for px in &out.pixels {
            assert_eq!(unpack_argb(*px)[3], 255);
        }
    }

    #[test]
    fn idle_frame_is_a_plain_copy() {
        let p = params(0.4);
        let base = gradient(12, 12);
        let mut state = RendererState::new(base.clone(), p.max_ripples);
        let mut out = FrameBuffer::filled(12, 12, 0);
        for _ in 0..5 {
            assert_eq!(step(&mut state, &p, &mut out).expect("ok"), FrameKind::Idle);
            assert_eq!(out, base);
        }
        assert!(state.field.is_zero());
    }

    #[test]
    fn stationary_pointer_spawns_nothing() {
        let p = params(0.4);
        let mut state = RendererState::new(gradient(40, 40), p.max_ripples);
        state.cursor.move_to(20.0, 20.0);
        let mut out = FrameBuffer::filled(40, 40, 0);
        for _ in 0..10 {
            step(&mut state, &p, &mut out).expect("ok");
            assert!(state.ripples.is_empty());
        }
    }

    #[test]
    fn moving_pointer_drops_ripples() {
        let p = params(0.4);
        let mut state = RendererState::new(gradient(40, 40), p.max_ripples);
        let mut out = FrameBuffer::filled(40, 40, 0);
        for i in 0..6 {
            state.cursor.move_to(5.0 + i as f32 * 5.0, 20.0);
            step(&mut state, &p, &mut out).expect("ok");
        }
        // first position arms, the next five each move 5px > 2px
        assert_eq!(state.ripples.len(), 5);
    }

    #[test]
    fn ripple_beyond_canvas_is_not_spawned() {
        let p = params(0.4);
        let mut state = RendererState::new(gradient(10, 10), p.max_ripples);
        let mut out = FrameBuffer::filled(10, 10, 0);
        state.cursor.move_to(5.0, 5.0);
        step(&mut state, &p, &mut out).expect("ok");
        state.cursor.move_to(50.0, 5.0);
        step(&mut state, &p, &mut out).expect("ok");
        assert!(state.ripples.is_empty());
        // spawn point still moved, so wiggling out there stays quiet too
        assert_eq!(state.cursor.last_spawn, Some((50.0, 5.0)));
    }

    #[test]
    fn step_rejects_wrong_output_size() {
        let p = params(0.4);
        let mut state = RendererState::new(gradient(10, 10), p.max_ripples);
        let mut out = FrameBuffer::filled(5, 10, 0);
        assert!(matches!(step(&mut state, &p, &mut out), Err(Error::SizeMismatch(_))));
    }

    #[test]
    fn background_until_image_arrives() {
        let mut r = renderer(true);
        assert_eq!(r.internal_size(), (100, 50));
        assert!(r.frame().pixels.iter().all(|&p| p == BG));
        assert!(!r.frames.is_scheduled());
        assert!(!r.tick().expect("ok"));
    }

    #[test]
    fn failed_load_shows_background_and_never_animates() {
        let mut r = renderer(true);
        r.image_loaded(Err(Error::ImageLoad { path: "x.png".into(), reason: "nope".into() }));
        assert!(!r.is_loaded());
        assert!(!r.frames.is_scheduled());
        r.pointer_moved(50.0, 50.0);
        r.set_animated(true);
        assert!(!r.frames.is_scheduled());
        assert!(!r.tick().expect("ok"));
        assert!(r.frame().pixels.iter().all(|&p| p == BG));
    }

    #[test]
    fn animated_load_starts_the_loop() {
        let mut r = loaded(true);
        assert!(r.frames.is_scheduled());
        assert!(r.tick().expect("ok"));
        // pointer never seen: idle frame equals baseline
        assert_eq!(r.frame(), &baseline_of(&r));
        // and the next frame is queued
        assert!(r.frames.is_scheduled());
    }

    #[test]
    fn static_load_draws_one_clean_frame() {
        let mut r = loaded(false);
        assert!(!r.frames.is_scheduled());
        assert_eq!(r.frame(), &baseline_of(&r));
        assert!(!r.tick().expect("ok"));
    }

    #[test]
    fn pointer_is_ignored_when_static() {
        let mut r = loaded(false);
        r.pointer_moved(100.0, 50.0);
        let state = r.state.as_ref().expect("loaded");
        assert_eq!(state.cursor.current, None);

        // still the clean picture, whatever the pointer did
        assert!(!r.tick().expect("ok"));
        assert_eq!(r.frame(), &baseline_of(&r));
        r.pointer_moved(140.0, 20.0);
        r.render_clean();
        assert_eq!(r.frame(), &baseline_of(&r));
    }

    #[test]
    fn toggling_animation_resets_ripples() {
        let mut r = loaded(true);
        r.pointer_moved(40.0, 40.0);
        r.tick().expect("ok");
        r.pointer_moved(80.0, 40.0);
        r.tick().expect("ok");
        assert_eq!(r.ripple_count(), 1);

        r.set_animated(false);
        r.set_animated(true);
        assert_eq!(r.ripple_count(), 0);
        let state = r.state.as_ref().expect("loaded");
        assert_eq!(state.cursor, CursorState::default());

        // nothing left to draw once the pointer is gone
        r.pointer_left();
        assert!(r.tick().expect("ok"));
        assert_eq!(r.frame(), &baseline_of(&r));
        assert_eq!(r.ripple_count(), 0);
    }

    #[test]
    fn first_move_after_reenable_only_arms_the_tracker() {
        let mut r = loaded(true);
        r.pointer_moved(40.0, 40.0);
        r.tick().expect("ok");
        r.set_animated(false);
        r.set_animated(true);

        // far from the old spawn point, but that point was forgotten
        r.pointer_moved(180.0, 90.0);
        r.tick().expect("ok");
        assert_eq!(r.ripple_count(), 0);
    }

    #[test]
    fn pointer_moves_are_scaled_to_the_buffer() {
        let mut r = loaded(true);
        r.pointer_moved(100.0, 40.0);
        let state = r.state.as_ref().expect("loaded");
        assert_eq!(state.cursor.current, Some((50.0, 20.0)));
        r.pointer_left();
        assert_eq!(r.state.as_ref().expect("loaded").cursor.current, None);
    }

    #[test]
    fn switching_off_mid_flight_stops_and_cleans() {
        let mut r = loaded(true);
        r.pointer_moved(100.0, 50.0);
        r.tick().expect("ok");
        r.pointer_moved(140.0, 50.0);
        r.tick().expect("ok");
        assert_ne!(r.frame(), &baseline_of(&r));

        r.set_animated(false);
        assert!(!r.frames.is_scheduled());
        assert_eq!(r.frame(), &baseline_of(&r));
        assert!(!r.tick().expect("ok"));
        assert_eq!(r.frame(), &baseline_of(&r));
    }

    #[test]
    fn rapid_toggling_keeps_a_single_request() {
        let mut r = loaded(true);
        for _ in 0..20 {
            r.set_animated(false);
            r.set_animated(true);
            r.set_animated(true);
        }
        assert!(r.frames.is_scheduled());
        let (issued, cancelled) = r.frames.stats();
        // everything issued except the live one was cancelled
        assert_eq!(issued, cancelled + 1);

        assert!(r.tick().expect("ok"));
        r.set_animated(false);
        assert!(!r.frames.is_scheduled());
        // the only request never cancelled is the one the frame consumed
        let (issued, cancelled) = r.frames.stats();
        assert_eq!(issued, cancelled + 1);
    }

    #[test]
    fn resize_rebuilds_buffers_and_rescales_ripples() {
        let mut r = loaded(true);
        r.pointer_moved(40.0, 40.0);
        r.tick().expect("ok");
        r.pointer_moved(80.0, 40.0);
        r.tick().expect("ok");
        assert_eq!(r.ripple_count(), 1);

        r.resize(400, 200);
        assert_eq!(r.internal_size(), (200, 100));
        assert_eq!(r.frame().width, 200);
        assert_eq!(r.frame().height, 100);
        let state = r.state.as_ref().expect("loaded");
        assert_eq!(state.baseline.width, 200);
        assert_eq!(state.field.width(), 200);
        let ripple = state.ripples.iter().next().copied().expect("kept");
        assert_eq!((ripple.x, ripple.y), (80.0, 40.0));

        // loop keeps running at the new size
        assert!(r.tick().expect("ok"));
    }

    #[test]
    fn resize_with_clear_policy_drops_ripples() {
        let settings = Settings { resolution: 0.5, background: BG, animated: true };
        let mut p = params(0.5);
        p.resize_policy = ResizePolicy::Clear;
        let mut r = WaterRenderer::new(settings, p, (200, 100));
        r.image_loaded(Ok(picture()));
        r.pointer_moved(40.0, 40.0);
        r.tick().expect("ok");
        r.pointer_moved(80.0, 40.0);
        r.tick().expect("ok");
        assert_eq!(r.ripple_count(), 1);

        r.resize(100, 60);
        assert_eq!(r.ripple_count(), 0);
        assert_eq!(r.internal_size(), (50, 30));
        assert!(r.tick().expect("ok"));
        assert_eq!(r.frame(), &baseline_of(&r));
    }

    #[test]
    fn resize_before_load_only_resizes_background() {
        let mut r = renderer(true);
        r.resize(60, 40);
        assert_eq!(r.internal_size(), (30, 20));
        assert_eq!(r.frame().pixels.len(), 600);
        assert!(r.frame().pixels.iter().all(|&p| p == BG));
    }

    #[test]
    fn shutdown_cancels_pending_frame() {
        let mut r = loaded(true);
        assert!(r.frames.is_scheduled());
        r.shutdown();
        assert!(!r.frames.is_scheduled());
        assert!(!r.tick().expect("ok"));
    }

    #[test]
    fn from_config_validates() {
        let mut c = Config::default();
        c.display.resolution = 2.0;
        assert!(WaterRenderer::from_config(&c, (100, 100)).is_err());
        c.display.resolution = 0.5;
        let r = WaterRenderer::from_config(&c, (100, 100)).expect("valid");
        assert_eq!(r.internal_size(), (50, 50));
        assert!(r.is_animated());
    }
}
