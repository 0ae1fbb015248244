#![deny(unsafe_code)]
//! Connected-particle drift effect.
//!
//! A batch of points drifts across the surface with constant velocities,
//! bouncing off the edges. Each frame every pair closer than a threshold
//! is joined by a line whose opacity fades with distance, and particles
//! near the pointer are pushed away from it and joined to it by a
//! thicker line. The `pulse` preset additionally breathes each particle's
//! radius along a per-particle sinusoid.
//!
//! The effect redraws itself in full every frame; the only state carried
//! across frames is the particle batch, the pointer, and the surface
//! dimensions.

use glam::DVec2;
use plexus_core::color::Rgba;
use plexus_core::error::EffectError;
use plexus_core::params::{param_f64, param_string, param_usize};
use plexus_core::prng::Xorshift64;
use plexus_core::surface::Surface;
use plexus_core::Effect;
use serde_json::{json, Value};
use std::f64::consts::TAU;

/// Default particle count for the drift preset.
const DRIFT_PARTICLE_COUNT: usize = 70;
/// Default speed constant s; velocity components are drawn from [-s/2, s/2).
const DRIFT_MOVE_SPEED: f64 = 0.5;
/// Default distance under which two particles are joined by a line.
const DRIFT_CONNECTION_DISTANCE: f64 = 150.0;
/// Default pointer repulsion radius R.
const DRIFT_POINTER_DISTANCE: f64 = 200.0;
/// Default repulsion strength multiplier.
const DRIFT_REPULSION_STRENGTH: f64 = 2.0;
/// Default lower bound of the base radius distribution.
const DRIFT_RADIUS_MIN: f64 = 1.0;
/// Default width of the base radius distribution.
const DRIFT_RADIUS_RANGE: f64 = 2.0;

/// Pulse preset: a denser, livelier field with breathing radii.
const PULSE_PARTICLE_COUNT: usize = 80;
const PULSE_MOVE_SPEED: f64 = 0.7;
const PULSE_CONNECTION_DISTANCE: f64 = 130.0;
const PULSE_POINTER_DISTANCE: f64 = 180.0;
const PULSE_RADIUS_RANGE: f64 = 2.5;
const PULSE_AMPLITUDE: f64 = 0.6;
const PULSE_RATE_MIN: f64 = 0.02;
const PULSE_RATE_RANGE: f64 = 0.03;

/// Shared base color (amber) and line styling.
const BASE_COLOR: Rgba = Rgba {
    r: 232.0 / 255.0,
    g: 124.0 / 255.0,
    b: 3.0 / 255.0,
    a: 1.0,
};
const BACKGROUND: Rgba = Rgba {
    r: 16.0 / 255.0,
    g: 16.0 / 255.0,
    b: 20.0 / 255.0,
    a: 1.0,
};
const PARTICLE_ALPHA: f64 = 0.5;
const CONNECTION_WIDTH: f64 = 1.0;
const POINTER_LINE_WIDTH: f64 = 1.5;

/// Smallest radius a pulsing particle can shrink to.
const MIN_RADIUS: f64 = 0.1;

/// Tuning constants for the particle field.
///
/// The `drift` preset is the plain field; the `pulse` preset retunes the
/// constants and enables the radius sinusoid (`pulse_amplitude > 0`).
/// Use [`Default`] for `drift`.
#[derive(Debug, Clone, Copy)]
pub struct FieldParams {
    /// Number of particles per batch generation.
    pub particle_count: usize,
    /// Speed constant s; velocity components are drawn from [-s/2, s/2).
    pub move_speed: f64,
    /// Pairs closer than this are joined by a connection line.
    pub connection_distance: f64,
    /// Pointer repulsion radius R; also the pointer-line reach.
    pub pointer_distance: f64,
    /// Multiplier on the repulsion displacement.
    pub repulsion_strength: f64,
    /// Lower bound of the base radius distribution.
    pub radius_min: f64,
    /// Width of the base radius distribution.
    pub radius_range: f64,
    /// Radius sinusoid amplitude; 0 disables the pulse entirely.
    pub pulse_amplitude: f64,
    /// Lower bound of the per-particle phase advance per frame (radians).
    pub pulse_rate_min: f64,
    /// Width of the pulse rate distribution.
    pub pulse_rate_range: f64,
    /// Base color shared by particles and lines.
    pub color: Rgba,
    /// Fill alpha for particle circles.
    pub particle_alpha: f64,
    /// Clear color painted at the start of every frame.
    pub background: Rgba,
    /// Stroke width of inter-particle connection lines.
    pub connection_width: f64,
    /// Stroke width of particle-to-pointer lines.
    pub pointer_line_width: f64,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self::drift()
    }
}

impl FieldParams {
    /// The plain drifting field.
    pub fn drift() -> Self {
        Self {
            particle_count: DRIFT_PARTICLE_COUNT,
            move_speed: DRIFT_MOVE_SPEED,
            connection_distance: DRIFT_CONNECTION_DISTANCE,
            pointer_distance: DRIFT_POINTER_DISTANCE,
            repulsion_strength: DRIFT_REPULSION_STRENGTH,
            radius_min: DRIFT_RADIUS_MIN,
            radius_range: DRIFT_RADIUS_RANGE,
            pulse_amplitude: 0.0,
            pulse_rate_min: 0.0,
            pulse_rate_range: 0.0,
            color: BASE_COLOR,
            particle_alpha: PARTICLE_ALPHA,
            background: BACKGROUND,
            connection_width: CONNECTION_WIDTH,
            pointer_line_width: POINTER_LINE_WIDTH,
        }
    }

    /// The retuned field with breathing radii.
    pub fn pulse() -> Self {
        Self {
            particle_count: PULSE_PARTICLE_COUNT,
            move_speed: PULSE_MOVE_SPEED,
            connection_distance: PULSE_CONNECTION_DISTANCE,
            pointer_distance: PULSE_POINTER_DISTANCE,
            radius_range: PULSE_RADIUS_RANGE,
            pulse_amplitude: PULSE_AMPLITUDE,
            pulse_rate_min: PULSE_RATE_MIN,
            pulse_rate_range: PULSE_RATE_RANGE,
            ..Self::drift()
        }
    }

    /// Returns a copy with values overridden from a JSON object.
    ///
    /// Missing keys keep this instance's values; `color` and `background`
    /// accept hex strings and are the only overrides that can fail.
    pub fn with_overrides(&self, params: &Value) -> Result<Self, EffectError> {
        Ok(Self {
            particle_count: param_usize(params, "particle_count", self.particle_count),
            move_speed: param_f64(params, "move_speed", self.move_speed),
            connection_distance: param_f64(
                params,
                "connection_distance",
                self.connection_distance,
            ),
            pointer_distance: param_f64(params, "pointer_distance", self.pointer_distance),
            repulsion_strength: param_f64(params, "repulsion_strength", self.repulsion_strength),
            radius_min: param_f64(params, "radius_min", self.radius_min),
            radius_range: param_f64(params, "radius_range", self.radius_range),
            pulse_amplitude: param_f64(params, "pulse_amplitude", self.pulse_amplitude),
            pulse_rate_min: param_f64(params, "pulse_rate_min", self.pulse_rate_min),
            pulse_rate_range: param_f64(params, "pulse_rate_range", self.pulse_rate_range),
            color: Rgba::from_hex(&param_string(params, "color", &self.color.to_hex()))?,
            particle_alpha: param_f64(params, "particle_alpha", self.particle_alpha),
            background: Rgba::from_hex(&param_string(
                params,
                "background",
                &self.background.to_hex(),
            ))?,
            connection_width: param_f64(params, "connection_width", self.connection_width),
            pointer_line_width: param_f64(params, "pointer_line_width", self.pointer_line_width),
        })
    }

    /// Rejects parameter combinations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), EffectError> {
        let positive = [
            ("connection_distance", self.connection_distance),
            ("pointer_distance", self.pointer_distance),
            ("radius_min", self.radius_min),
            ("connection_width", self.connection_width),
            ("pointer_line_width", self.pointer_line_width),
        ];
        let non_negative = [
            ("move_speed", self.move_speed),
            ("repulsion_strength", self.repulsion_strength),
            ("radius_range", self.radius_range),
            ("pulse_amplitude", self.pulse_amplitude),
            ("pulse_rate_min", self.pulse_rate_min),
            ("pulse_rate_range", self.pulse_rate_range),
        ];
        if self.particle_count == 0 {
            return Err(EffectError::InvalidParams(
                "particle_count must be at least 1".into(),
            ));
        }
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(EffectError::InvalidParams(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(EffectError::InvalidParams(format!(
                    "{name} must be non-negative and finite, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.particle_alpha) {
            return Err(EffectError::InvalidParams(format!(
                "particle_alpha must be in [0, 1], got {}",
                self.particle_alpha
            )));
        }
        Ok(())
    }
}

/// A single drifting particle.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Position in surface pixels.
    pub pos: DVec2,
    /// Per-frame position delta.
    pub vel: DVec2,
    /// Base radius, fixed at spawn.
    pub radius: f64,
    /// Current phase of the radius sinusoid.
    pub pulse_phase: f64,
    /// Phase advance per frame.
    pub pulse_rate: f64,
}

impl Particle {
    fn spawn(rng: &mut Xorshift64, width: f64, height: f64, params: &FieldParams) -> Self {
        let half_speed = params.move_speed / 2.0;
        Self {
            pos: DVec2::new(rng.next_range(0.0, width), rng.next_range(0.0, height)),
            vel: DVec2::new(
                rng.next_range(-half_speed, half_speed),
                rng.next_range(-half_speed, half_speed),
            ),
            radius: rng.next_range(params.radius_min, params.radius_min + params.radius_range),
            pulse_phase: rng.next_angle(),
            pulse_rate: rng.next_range(
                params.pulse_rate_min,
                params.pulse_rate_min + params.pulse_rate_range,
            ),
        }
    }

    /// Radius as drawn this frame: base plus the sinusoid, floored so a
    /// deep pulse can never produce a non-positive circle.
    pub fn effective_radius(&self, amplitude: f64) -> f64 {
        (self.radius + amplitude * self.pulse_phase.sin()).max(MIN_RADIUS)
    }
}

/// The particle field simulation context.
///
/// Owns everything the per-frame loop touches: the batch, the pointer,
/// the surface dimensions, the tuning, and the PRNG that spawns batches.
pub struct ParticleField {
    width: f64,
    height: f64,
    pointer: Option<DVec2>,
    particles: Vec<Particle>,
    params: FieldParams,
    rng: Xorshift64,
}

impl ParticleField {
    /// Creates a field and spawns its first particle batch.
    ///
    /// Positions are uniform over [0, width) × [0, height), velocity
    /// components uniform over [-s/2, s/2), radii uniform over
    /// [radius_min, radius_min + radius_range), pulse phases uniform
    /// over [0, 2π).
    pub fn new(
        width: f64,
        height: f64,
        seed: u64,
        params: FieldParams,
    ) -> Result<Self, EffectError> {
        validate_dimensions(width, height)?;
        params.validate()?;
        let mut field = Self {
            width,
            height,
            pointer: None,
            particles: Vec::new(),
            params,
            rng: Xorshift64::new(seed),
        };
        field.spawn_batch();
        Ok(field)
    }

    /// Creates a field from drift defaults overridden by a JSON object.
    pub fn from_json(
        width: f64,
        height: f64,
        seed: u64,
        json_params: &Value,
    ) -> Result<Self, EffectError> {
        Self::new(
            width,
            height,
            seed,
            FieldParams::default().with_overrides(json_params)?,
        )
    }

    /// Surface width in pixels.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Current pointer position, if inside the viewport.
    pub fn pointer(&self) -> Option<DVec2> {
        self.pointer
    }

    /// Read-only access to the current batch.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// The active tuning constants.
    pub fn tuning(&self) -> &FieldParams {
        &self.params
    }

    /// Discards the batch and spawns a fresh one for the current
    /// dimensions. The PRNG stream continues, so the whole call sequence
    /// stays reproducible from the seed.
    fn spawn_batch(&mut self) {
        let mut particles = Vec::with_capacity(self.params.particle_count);
        for _ in 0..self.params.particle_count {
            particles.push(Particle::spawn(
                &mut self.rng,
                self.width,
                self.height,
                &self.params,
            ));
        }
        self.particles = particles;
    }
}

impl Effect for ParticleField {
    fn step(&mut self) -> Result<(), EffectError> {
        let width = self.width;
        let height = self.height;
        let pointer = self.pointer;
        let repulsion_radius = self.params.pointer_distance;
        let strength = self.params.repulsion_strength;

        for particle in &mut self.particles {
            particle.pos += particle.vel;
            particle.pulse_phase = (particle.pulse_phase + particle.pulse_rate).rem_euclid(TAU);

            reflect(particle.pos.x, &mut particle.vel.x, width);
            reflect(particle.pos.y, &mut particle.vel.y, height);

            if let Some(pointer) = pointer {
                particle.pos += repulsion(particle.pos, pointer, repulsion_radius, strength);
            }
        }
        Ok(())
    }

    fn render(&self, surface: &mut dyn Surface) {
        let p = &self.params;
        surface.clear(p.background);
        let fill = p.color.with_alpha(p.particle_alpha);

        for (i, particle) in self.particles.iter().enumerate() {
            surface.fill_circle(
                particle.pos,
                particle.effective_radius(p.pulse_amplitude),
                fill,
            );

            for other in &self.particles[i + 1..] {
                let dist = particle.pos.distance(other.pos);
                if dist < p.connection_distance {
                    let color = p.color.with_alpha(line_alpha(dist, p.connection_distance));
                    surface.stroke_line(particle.pos, other.pos, p.connection_width, color);
                }
            }

            if let Some(pointer) = self.pointer {
                let dist = particle.pos.distance(pointer);
                if dist < p.pointer_distance {
                    let color = p.color.with_alpha(line_alpha(dist, p.pointer_distance));
                    surface.stroke_line(particle.pos, pointer, p.pointer_line_width, color);
                }
            }
        }
    }

    fn set_pointer(&mut self, pointer: Option<DVec2>) {
        self.pointer = pointer;
    }

    fn resize(&mut self, width: f64, height: f64) -> Result<(), EffectError> {
        validate_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        self.spawn_batch();
        Ok(())
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "particle_count": p.particle_count,
            "move_speed": p.move_speed,
            "connection_distance": p.connection_distance,
            "pointer_distance": p.pointer_distance,
            "repulsion_strength": p.repulsion_strength,
            "radius_min": p.radius_min,
            "radius_range": p.radius_range,
            "pulse_amplitude": p.pulse_amplitude,
            "pulse_rate_min": p.pulse_rate_min,
            "pulse_rate_range": p.pulse_rate_range,
            "color": p.color.to_hex(),
            "particle_alpha": p.particle_alpha,
            "background": p.background.to_hex(),
            "connection_width": p.connection_width,
            "pointer_line_width": p.pointer_line_width,
        })
    }

    fn param_schema(&self) -> Value {
        json!({
            "particle_count": {
                "type": "integer",
                "default": DRIFT_PARTICLE_COUNT,
                "min": 1,
                "description": "Number of particles per batch generation"
            },
            "move_speed": {
                "type": "number",
                "default": DRIFT_MOVE_SPEED,
                "min": 0.0,
                "description": "Speed constant s; velocity components are drawn from [-s/2, s/2)"
            },
            "connection_distance": {
                "type": "number",
                "default": DRIFT_CONNECTION_DISTANCE,
                "min": 0.0,
                "description": "Pairs closer than this are joined by a line"
            },
            "pointer_distance": {
                "type": "number",
                "default": DRIFT_POINTER_DISTANCE,
                "min": 0.0,
                "description": "Pointer repulsion radius; also the pointer-line reach"
            },
            "repulsion_strength": {
                "type": "number",
                "default": DRIFT_REPULSION_STRENGTH,
                "min": 0.0,
                "description": "Multiplier on the repulsion displacement"
            },
            "radius_min": {
                "type": "number",
                "default": DRIFT_RADIUS_MIN,
                "min": 0.0,
                "description": "Lower bound of the base radius distribution"
            },
            "radius_range": {
                "type": "number",
                "default": DRIFT_RADIUS_RANGE,
                "min": 0.0,
                "description": "Width of the base radius distribution"
            },
            "pulse_amplitude": {
                "type": "number",
                "default": 0.0,
                "min": 0.0,
                "description": "Radius sinusoid amplitude; 0 disables the pulse"
            },
            "pulse_rate_min": {
                "type": "number",
                "default": 0.0,
                "min": 0.0,
                "description": "Lower bound of the phase advance per frame (radians)"
            },
            "pulse_rate_range": {
                "type": "number",
                "default": 0.0,
                "min": 0.0,
                "description": "Width of the pulse rate distribution"
            },
            "color": {
                "type": "string",
                "default": BASE_COLOR.to_hex(),
                "description": "Base color shared by particles and lines (hex)"
            },
            "particle_alpha": {
                "type": "number",
                "default": PARTICLE_ALPHA,
                "min": 0.0,
                "max": 1.0,
                "description": "Fill alpha for particle circles"
            },
            "background": {
                "type": "string",
                "default": BACKGROUND.to_hex(),
                "description": "Clear color painted at the start of every frame (hex)"
            },
            "connection_width": {
                "type": "number",
                "default": CONNECTION_WIDTH,
                "min": 0.0,
                "description": "Stroke width of inter-particle connection lines"
            },
            "pointer_line_width": {
                "type": "number",
                "default": POINTER_LINE_WIDTH,
                "min": 0.0,
                "description": "Stroke width of particle-to-pointer lines"
            }
        })
    }
}

/// Rejects zero, negative, or non-finite surface dimensions.
fn validate_dimensions(width: f64, height: f64) -> Result<(), EffectError> {
    if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
        return Err(EffectError::InvalidDimensions);
    }
    Ok(())
}

/// Negates `vel` when `pos` has left [0, limit] and is still moving outward.
///
/// The outward check means one crossing flips the sign exactly once, even
/// if repulsion holds the particle outside the bound for several frames.
/// A reflect, not a clamp: positions may exceed the bound by up to one
/// frame's velocity.
fn reflect(pos: f64, vel: &mut f64, limit: f64) {
    if (pos < 0.0 && *vel < 0.0) || (pos > limit && *vel > 0.0) {
        *vel = -*vel;
    }
}

/// Position offset pushing a particle out of the pointer's repulsion radius.
///
/// The offset is along the pointer→particle direction, scaled by
/// `strength · (radius − dist) / radius`. Zero when the particle is at or
/// beyond the radius, and zero when it sits exactly on the pointer — no
/// direction is defined there, so that frame applies no repulsion.
fn repulsion(pos: DVec2, pointer: DVec2, radius: f64, strength: f64) -> DVec2 {
    let delta = pos - pointer;
    let dist = delta.length();
    if dist <= 0.0 || dist >= radius {
        return DVec2::ZERO;
    }
    let force = (radius - dist) / radius;
    delta / dist * force * strength
}

/// Line opacity for a pair at `dist`: fades linearly from 1 at distance
/// zero to 0 at `limit`.
fn line_alpha(dist: f64, limit: f64) -> f64 {
    1.0 - dist / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Surface double recording every draw call.
    #[derive(Debug)]
    enum Draw {
        Clear(Rgba),
        Circle {
            center: DVec2,
            radius: f64,
            color: Rgba,
        },
        Line {
            a: DVec2,
            b: DVec2,
            width: f64,
            color: Rgba,
        },
    }

    #[derive(Default)]
    struct RecordingSurface {
        draws: Vec<Draw>,
    }

    impl RecordingSurface {
        fn circles(&self) -> Vec<(DVec2, f64, Rgba)> {
            self.draws
                .iter()
                .filter_map(|d| match d {
                    Draw::Circle {
                        center,
                        radius,
                        color,
                    } => Some((*center, *radius, *color)),
                    _ => None,
                })
                .collect()
        }

        fn lines(&self) -> Vec<(DVec2, DVec2, f64, Rgba)> {
            self.draws
                .iter()
                .filter_map(|d| match d {
                    Draw::Line { a, b, width, color } => Some((*a, *b, *width, *color)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for RecordingSurface {
        fn clear(&mut self, color: Rgba) {
            self.draws.push(Draw::Clear(color));
        }

        fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba) {
            self.draws.push(Draw::Circle {
                center,
                radius,
                color,
            });
        }

        fn stroke_line(&mut self, a: DVec2, b: DVec2, width: f64, color: Rgba) {
            self.draws.push(Draw::Line { a, b, width, color });
        }
    }

    /// Helper: drift field with default params.
    fn field(width: f64, height: f64, seed: u64) -> ParticleField {
        ParticleField::new(width, height, seed, FieldParams::drift()).unwrap()
    }

    /// Helper: a field holding exactly the given particles, zero pulse.
    fn field_with_particles(width: f64, height: f64, particles: Vec<Particle>) -> ParticleField {
        let params = FieldParams {
            particle_count: particles.len(),
            ..FieldParams::drift()
        };
        let mut f = ParticleField::new(width, height, 1, params).unwrap();
        f.particles = particles;
        f
    }

    fn still(x: f64, y: f64) -> Particle {
        Particle {
            pos: DVec2::new(x, y),
            vel: DVec2::ZERO,
            radius: 1.5,
            pulse_phase: 0.0,
            pulse_rate: 0.0,
        }
    }

    // ---- Construction tests ----

    #[test]
    fn new_spawns_exact_particle_count() {
        let f = field(800.0, 600.0, 42);
        assert_eq!(f.particles().len(), DRIFT_PARTICLE_COUNT);
    }

    #[test]
    fn new_places_particles_within_bounds_and_distributions() {
        let f = field(800.0, 600.0, 42);
        let half_speed = DRIFT_MOVE_SPEED / 2.0;
        for p in f.particles() {
            assert!((0.0..800.0).contains(&p.pos.x), "x out of bounds: {}", p.pos.x);
            assert!((0.0..600.0).contains(&p.pos.y), "y out of bounds: {}", p.pos.y);
            assert!(p.vel.x.abs() <= half_speed, "vx too fast: {}", p.vel.x);
            assert!(p.vel.y.abs() <= half_speed, "vy too fast: {}", p.vel.y);
            assert!(
                (DRIFT_RADIUS_MIN..DRIFT_RADIUS_MIN + DRIFT_RADIUS_RANGE).contains(&p.radius),
                "radius out of range: {}",
                p.radius
            );
            assert!((0.0..TAU).contains(&p.pulse_phase));
        }
    }

    #[test]
    fn new_rejects_zero_particle_count() {
        let params = FieldParams {
            particle_count: 0,
            ..FieldParams::drift()
        };
        assert!(matches!(
            ParticleField::new(800.0, 600.0, 42, params),
            Err(EffectError::InvalidParams(_))
        ));
    }

    #[test]
    fn new_rejects_bad_dimensions() {
        let p = FieldParams::drift();
        assert!(ParticleField::new(0.0, 600.0, 42, p).is_err());
        assert!(ParticleField::new(800.0, -1.0, 42, p).is_err());
        assert!(ParticleField::new(f64::NAN, 600.0, 42, p).is_err());
        assert!(ParticleField::new(f64::INFINITY, 600.0, 42, p).is_err());
    }

    #[test]
    fn drift_preset_has_no_pulse() {
        let f = field(800.0, 600.0, 42);
        assert_eq!(f.tuning().pulse_amplitude, 0.0);
        for p in f.particles() {
            assert_eq!(p.effective_radius(f.tuning().pulse_amplitude), p.radius);
        }
    }

    #[test]
    fn pulse_preset_assigns_rates_in_range() {
        let f = ParticleField::new(800.0, 600.0, 42, FieldParams::pulse()).unwrap();
        assert!(f.tuning().pulse_amplitude > 0.0);
        for p in f.particles() {
            assert!(
                (PULSE_RATE_MIN..PULSE_RATE_MIN + PULSE_RATE_RANGE).contains(&p.pulse_rate),
                "pulse rate out of range: {}",
                p.pulse_rate
            );
        }
    }

    #[test]
    fn from_json_empty_uses_drift_defaults() {
        let f = ParticleField::from_json(800.0, 600.0, 42, &json!({})).unwrap();
        assert_eq!(f.tuning().particle_count, DRIFT_PARTICLE_COUNT);
        assert_eq!(f.tuning().move_speed, DRIFT_MOVE_SPEED);
    }

    #[test]
    fn with_overrides_applies_values() {
        let params = FieldParams::drift()
            .with_overrides(&json!({
                "particle_count": 12,
                "move_speed": 1.25,
                "color": "#3fa7d6",
            }))
            .unwrap();
        assert_eq!(params.particle_count, 12);
        assert_eq!(params.move_speed, 1.25);
        assert_eq!(params.color.to_hex(), "#3fa7d6");
        // Untouched keys keep the preset's values.
        assert_eq!(params.connection_distance, DRIFT_CONNECTION_DISTANCE);
    }

    #[test]
    fn with_overrides_rejects_bad_color() {
        let result = FieldParams::drift().with_overrides(&json!({"color": "nope"}));
        assert!(matches!(result, Err(EffectError::InvalidColor(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let base = FieldParams::drift();
        let cases = [
            FieldParams {
                connection_distance: 0.0,
                ..base
            },
            FieldParams {
                pointer_distance: -1.0,
                ..base
            },
            FieldParams {
                move_speed: f64::NAN,
                ..base
            },
            FieldParams {
                particle_alpha: 1.5,
                ..base
            },
            FieldParams {
                radius_min: 0.0,
                ..base
            },
        ];
        for params in cases {
            assert!(
                matches!(params.validate(), Err(EffectError::InvalidParams(_))),
                "expected rejection for {params:?}"
            );
        }
    }

    // ---- Determinism tests ----

    #[test]
    fn same_seed_identical_batches() {
        let a = field(800.0, 600.0, 12345);
        let b = field(800.0, 600.0, 12345);
        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.pos.x.to_bits(), pb.pos.x.to_bits());
            assert_eq!(pa.pos.y.to_bits(), pb.pos.y.to_bits());
            assert_eq!(pa.vel.x.to_bits(), pb.vel.x.to_bits());
            assert_eq!(pa.radius.to_bits(), pb.radius.to_bits());
        }
    }

    #[test]
    fn same_seed_identical_after_100_steps_with_pointer() {
        let mut a = field(800.0, 600.0, 42);
        let mut b = field(800.0, 600.0, 42);
        a.set_pointer(Some(DVec2::new(400.0, 300.0)));
        b.set_pointer(Some(DVec2::new(400.0, 300.0)));
        for _ in 0..100 {
            a.step().unwrap();
            b.step().unwrap();
        }
        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.pos.x.to_bits(), pb.pos.x.to_bits());
            assert_eq!(pa.pos.y.to_bits(), pb.pos.y.to_bits());
        }
    }

    #[test]
    fn different_seed_different_batch() {
        let a = field(800.0, 600.0, 1);
        let b = field(800.0, 600.0, 2);
        assert!(a
            .particles()
            .iter()
            .zip(b.particles())
            .any(|(pa, pb)| pa.pos.x.to_bits() != pb.pos.x.to_bits()));
    }

    // ---- Step correctness tests ----

    #[test]
    fn step_advances_position_by_exactly_velocity_without_pointer() {
        let mut p = still(100.0, 200.0);
        p.vel = DVec2::new(0.25, -0.4);
        let mut f = field_with_particles(800.0, 600.0, vec![p]);
        f.step().unwrap();
        let moved = &f.particles()[0];
        assert_eq!(moved.pos.x, 100.25);
        assert_eq!(moved.pos.y, 200.0 - 0.4);
    }

    #[test]
    fn right_boundary_crossing_flips_velocity_exactly_once() {
        let mut p = still(799.6, 300.0);
        p.vel = DVec2::new(1.0, 0.0);
        let mut f = field_with_particles(800.0, 600.0, vec![p]);

        // Frame 1: crosses to 800.6, outside and moving outward -> flip.
        f.step().unwrap();
        assert_eq!(f.particles()[0].vel.x, -1.0);

        // Frame 2: at 799.6, back inside -> no second flip.
        f.step().unwrap();
        assert_eq!(f.particles()[0].vel.x, -1.0);
    }

    #[test]
    fn no_re_flip_while_still_outside_the_bound() {
        // Starts well past the edge (as repulsion can leave it), moving out.
        let mut p = still(805.0, 300.0);
        p.vel = DVec2::new(0.5, 0.0);
        let mut f = field_with_particles(800.0, 600.0, vec![p]);

        f.step().unwrap();
        assert_eq!(f.particles()[0].vel.x, -0.5, "first frame flips");

        // Still outside for several frames, but now moving inward: no flip.
        for _ in 0..3 {
            f.step().unwrap();
            assert_eq!(f.particles()[0].vel.x, -0.5);
        }
    }

    #[test]
    fn top_boundary_reflects_y() {
        let mut p = still(400.0, 0.3);
        p.vel = DVec2::new(0.0, -0.5);
        let mut f = field_with_particles(800.0, 600.0, vec![p]);
        f.step().unwrap();
        assert_eq!(f.particles()[0].vel.y, 0.5);
    }

    #[test]
    fn pulse_phase_wraps_within_full_turn() {
        let mut p = still(400.0, 300.0);
        p.pulse_phase = TAU - 0.05;
        p.pulse_rate = 0.2;
        let mut f = field_with_particles(800.0, 600.0, vec![p]);
        f.step().unwrap();
        let phase = f.particles()[0].pulse_phase;
        assert!((0.0..TAU).contains(&phase), "phase not wrapped: {phase}");
        assert!((phase - 0.15).abs() < 1e-12);
    }

    #[test]
    fn full_pulse_cycle_returns_to_base_radius() {
        let steps = 128;
        let mut p = still(400.0, 300.0);
        p.pulse_phase = 1.0;
        p.pulse_rate = TAU / steps as f64;
        let mut f = field_with_particles(800.0, 600.0, vec![p]);

        let amplitude = 0.6;
        let before = f.particles()[0].effective_radius(amplitude);
        for _ in 0..steps {
            f.step().unwrap();
        }
        let after = f.particles()[0].effective_radius(amplitude);
        assert!(
            (after - before).abs() < 1e-9,
            "radius did not return after a full cycle: {before} vs {after}"
        );
    }

    #[test]
    fn effective_radius_is_floored_at_a_positive_epsilon() {
        let mut p = still(0.0, 0.0);
        p.radius = 0.2;
        p.pulse_phase = 1.5 * std::f64::consts::PI; // sin = -1
        assert_eq!(p.effective_radius(5.0), MIN_RADIUS);
    }

    #[test]
    fn repulsion_pushes_directly_away_from_pointer() {
        let mut f = field_with_particles(800.0, 600.0, vec![still(100.0, 100.0)]);
        f.set_pointer(Some(DVec2::new(90.0, 100.0)));
        f.step().unwrap();
        let p = &f.particles()[0];
        let expected =
            DRIFT_REPULSION_STRENGTH * (DRIFT_POINTER_DISTANCE - 10.0) / DRIFT_POINTER_DISTANCE;
        assert!((p.pos.x - (100.0 + expected)).abs() < 1e-12);
        assert_eq!(p.pos.y, 100.0);
        assert_eq!(p.vel, DVec2::ZERO, "repulsion must not touch velocity");
    }

    #[test]
    fn repulsion_outside_radius_has_no_effect() {
        let mut f = field_with_particles(800.0, 600.0, vec![still(100.0, 100.0)]);
        f.set_pointer(Some(DVec2::new(100.0 + DRIFT_POINTER_DISTANCE + 1.0, 100.0)));
        f.step().unwrap();
        assert_eq!(f.particles()[0].pos, DVec2::new(100.0, 100.0));
    }

    #[test]
    fn pointer_on_exact_particle_position_is_skipped() {
        let mut f = field_with_particles(800.0, 600.0, vec![still(250.0, 250.0)]);
        f.set_pointer(Some(DVec2::new(250.0, 250.0)));
        f.step().unwrap();
        let p = &f.particles()[0];
        assert!(p.pos.x.is_finite() && p.pos.y.is_finite());
        assert_eq!(p.pos, DVec2::new(250.0, 250.0));
    }

    #[test]
    fn clearing_the_pointer_stops_repulsion() {
        let mut f = field_with_particles(800.0, 600.0, vec![still(100.0, 100.0)]);
        f.set_pointer(Some(DVec2::new(90.0, 100.0)));
        f.step().unwrap();
        let pushed = f.particles()[0].pos;
        f.set_pointer(None);
        f.step().unwrap();
        assert_eq!(f.particles()[0].pos, pushed);
    }

    // ---- Fade rule ----

    #[test]
    fn line_alpha_fades_linearly_and_hits_zero_at_the_limit() {
        assert_eq!(line_alpha(0.0, 150.0), 1.0);
        assert_eq!(line_alpha(150.0, 150.0), 0.0);
        assert!((line_alpha(75.0, 150.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn line_alpha_is_strictly_decreasing_in_distance() {
        let mut prev = f64::INFINITY;
        for i in 0..=100 {
            let alpha = line_alpha(i as f64 * 1.5, 150.0);
            assert!(alpha < prev, "alpha not strictly decreasing at {i}");
            prev = alpha;
        }
    }

    // ---- Resize ----

    #[test]
    fn resize_respawns_a_full_batch_within_new_bounds() {
        let mut f = field(800.0, 600.0, 42);
        f.resize(320.0, 200.0).unwrap();
        assert_eq!(f.width(), 320.0);
        assert_eq!(f.height(), 200.0);
        assert_eq!(f.particles().len(), DRIFT_PARTICLE_COUNT);
        for p in f.particles() {
            assert!((0.0..320.0).contains(&p.pos.x));
            assert!((0.0..200.0).contains(&p.pos.y));
        }
    }

    #[test]
    fn resize_rejects_bad_dimensions_and_keeps_state() {
        let mut f = field(800.0, 600.0, 42);
        let before: Vec<u64> = f.particles().iter().map(|p| p.pos.x.to_bits()).collect();
        assert!(f.resize(0.0, 200.0).is_err());
        assert_eq!(f.width(), 800.0);
        let after: Vec<u64> = f.particles().iter().map(|p| p.pos.x.to_bits()).collect();
        assert_eq!(before, after, "failed resize must not respawn the batch");
    }

    // ---- Render ----

    #[test]
    fn render_clears_first_then_draws_one_circle_per_particle() {
        let f = field(800.0, 600.0, 42);
        let mut surface = RecordingSurface::default();
        f.render(&mut surface);
        assert!(
            matches!(surface.draws[0], Draw::Clear(c) if c == BACKGROUND),
            "first draw must clear to the background"
        );
        assert_eq!(surface.circles().len(), DRIFT_PARTICLE_COUNT);
    }

    #[test]
    fn two_distant_still_particles_draw_no_connection() {
        // Surface 800×600, particles at (0,300) and (799,300), zero velocity:
        // one frame flips nothing and 799 ≥ 150 draws nothing.
        let mut f =
            field_with_particles(800.0, 600.0, vec![still(0.0, 300.0), still(799.0, 300.0)]);
        f.step().unwrap();
        assert_eq!(f.particles()[0].vel, DVec2::ZERO);
        assert_eq!(f.particles()[1].vel, DVec2::ZERO);

        let mut surface = RecordingSurface::default();
        f.render(&mut surface);
        assert_eq!(surface.lines().len(), 0);
    }

    #[test]
    fn the_same_pair_connects_when_the_threshold_allows_it() {
        let params = FieldParams {
            particle_count: 2,
            connection_distance: 800.0,
            ..FieldParams::drift()
        };
        let mut f = ParticleField::new(800.0, 600.0, 1, params).unwrap();
        f.particles = vec![still(0.0, 300.0), still(799.0, 300.0)];

        let mut surface = RecordingSurface::default();
        f.render(&mut surface);
        let lines = surface.lines();
        assert_eq!(lines.len(), 1);
        let (_, _, width, color) = lines[0];
        assert_eq!(width, CONNECTION_WIDTH);
        assert!((color.a - (1.0 - 799.0 / 800.0)).abs() < 1e-12);
    }

    #[test]
    fn closer_pairs_draw_more_opaque_connections() {
        let near = {
            let f = field_with_particles(800.0, 600.0, vec![still(0.0, 0.0), still(30.0, 0.0)]);
            let mut surface = RecordingSurface::default();
            f.render(&mut surface);
            surface.lines()[0].3.a
        };
        let far = {
            let f = field_with_particles(800.0, 600.0, vec![still(0.0, 0.0), still(120.0, 0.0)]);
            let mut surface = RecordingSurface::default();
            f.render(&mut surface);
            surface.lines()[0].3.a
        };
        assert!(near > far, "closer pair must be more opaque: {near} vs {far}");
    }

    #[test]
    fn pointer_lines_use_the_thicker_stroke_and_their_own_fade() {
        let mut f = field_with_particles(800.0, 600.0, vec![still(100.0, 100.0)]);
        f.set_pointer(Some(DVec2::new(150.0, 100.0)));
        let mut surface = RecordingSurface::default();
        f.render(&mut surface);

        let lines = surface.lines();
        assert_eq!(lines.len(), 1);
        let (a, b, width, color) = lines[0];
        assert_eq!(a, DVec2::new(100.0, 100.0));
        assert_eq!(b, DVec2::new(150.0, 100.0));
        assert_eq!(width, POINTER_LINE_WIDTH);
        assert!((color.a - (1.0 - 50.0 / DRIFT_POINTER_DISTANCE)).abs() < 1e-12);
    }

    #[test]
    fn no_pointer_means_no_pointer_lines() {
        let f = field_with_particles(800.0, 600.0, vec![still(100.0, 100.0)]);
        let mut surface = RecordingSurface::default();
        f.render(&mut surface);
        assert_eq!(surface.lines().len(), 0);
    }

    #[test]
    fn rendered_radius_includes_the_pulse() {
        let mut f = ParticleField::new(800.0, 600.0, 42, FieldParams::pulse()).unwrap();
        f.particles = vec![Particle {
            pos: DVec2::new(400.0, 300.0),
            vel: DVec2::ZERO,
            radius: 2.0,
            pulse_phase: std::f64::consts::FRAC_PI_2, // sin = 1
            pulse_rate: 0.0,
        }];
        let mut surface = RecordingSurface::default();
        f.render(&mut surface);
        let (_, radius, _) = surface.circles()[0];
        assert!((radius - (2.0 + PULSE_AMPLITUDE)).abs() < 1e-12);
    }

    #[test]
    fn particle_fill_uses_base_color_at_particle_alpha() {
        let f = field(800.0, 600.0, 42);
        let mut surface = RecordingSurface::default();
        f.render(&mut surface);
        let (_, _, color) = surface.circles()[0];
        assert_eq!(color, BASE_COLOR.with_alpha(PARTICLE_ALPHA));
    }

    // ---- Trait compliance ----

    #[test]
    fn effect_is_object_safe() {
        let f = field(800.0, 600.0, 42);
        let boxed: Box<dyn Effect> = Box::new(f);
        assert_eq!(boxed.params()["particle_count"], 70);
    }

    #[test]
    fn params_reflects_current_tuning() {
        let f = ParticleField::new(800.0, 600.0, 42, FieldParams::pulse()).unwrap();
        let params = f.params();
        assert_eq!(params["particle_count"], PULSE_PARTICLE_COUNT);
        assert_eq!(params["pulse_amplitude"], PULSE_AMPLITUDE);
        assert_eq!(params["color"], "#e87c03");
    }

    #[test]
    fn param_schema_covers_every_parameter() {
        let f = field(800.0, 600.0, 42);
        let schema = f.param_schema();
        for key in [
            "particle_count",
            "move_speed",
            "connection_distance",
            "pointer_distance",
            "repulsion_strength",
            "radius_min",
            "radius_range",
            "pulse_amplitude",
            "pulse_rate_min",
            "pulse_rate_range",
            "color",
            "particle_alpha",
            "background",
            "connection_width",
            "pointer_line_width",
        ] {
            assert!(schema.get(key).is_some(), "schema missing parameter: {key}");
            assert!(schema[key].get("type").is_some(), "{key} missing 'type'");
            assert!(
                schema[key].get("description").is_some(),
                "{key} missing 'description'"
            );
        }
    }

    // ---- Property-based tests ----

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn dimension() -> impl Strategy<Value = f64> {
            50.0_f64..800.0
        }

        proptest! {
            #[test]
            fn positions_stay_near_the_surface_without_pointer(
                seed: u64,
                w in dimension(),
                h in dimension(),
            ) {
                let mut f = ParticleField::new(w, h, seed, FieldParams::drift()).unwrap();
                for _ in 0..200 {
                    f.step().unwrap();
                }
                // A particle can overshoot a bound by at most one frame's
                // travel before the reflection turns it around.
                let slack = DRIFT_MOVE_SPEED / 2.0 + 1e-9;
                for p in f.particles() {
                    prop_assert!(p.pos.x >= -slack && p.pos.x <= w + slack, "x escaped: {}", p.pos.x);
                    prop_assert!(p.pos.y >= -slack && p.pos.y <= h + slack, "y escaped: {}", p.pos.y);
                }
            }

            #[test]
            fn no_nans_with_an_arbitrary_pointer(
                seed: u64,
                px in -100.0_f64..900.0,
                py in -100.0_f64..700.0,
            ) {
                let mut f = ParticleField::new(800.0, 600.0, seed, FieldParams::pulse()).unwrap();
                f.set_pointer(Some(DVec2::new(px, py)));
                for _ in 0..50 {
                    f.step().unwrap();
                }
                for p in f.particles() {
                    prop_assert!(p.pos.x.is_finite() && p.pos.y.is_finite());
                    prop_assert!(p.effective_radius(f.tuning().pulse_amplitude) > 0.0);
                }
            }

            #[test]
            fn deterministic_across_instances(seed: u64, w in dimension(), h in dimension()) {
                let mut a = ParticleField::new(w, h, seed, FieldParams::drift()).unwrap();
                let mut b = ParticleField::new(w, h, seed, FieldParams::drift()).unwrap();
                for _ in 0..20 {
                    a.step().unwrap();
                    b.step().unwrap();
                }
                for (pa, pb) in a.particles().iter().zip(b.particles()) {
                    prop_assert_eq!(pa.pos.x.to_bits(), pb.pos.x.to_bits());
                    prop_assert_eq!(pa.pos.y.to_bits(), pb.pos.y.to_bits());
                }
            }

            #[test]
            fn resize_always_respawns_the_configured_count(
                seed: u64,
                w in dimension(),
                h in dimension(),
            ) {
                let mut f = ParticleField::new(640.0, 480.0, seed, FieldParams::pulse()).unwrap();
                f.resize(w, h).unwrap();
                prop_assert_eq!(f.particles().len(), PULSE_PARTICLE_COUNT);
                for p in f.particles() {
                    prop_assert!((0.0..w).contains(&p.pos.x));
                    prop_assert!((0.0..h).contains(&p.pos.y));
                }
            }
        }
    }
}
