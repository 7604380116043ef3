use std::num::NonZeroUsize;

use bevy::color::Color;
use rand::Rng;

use crate::vector2::Vector2;

pub const G: f64 = 1000.0;

/// Each star's mass is drawn from this range, then scaled by `4 / N`.
const MASS_RANGE: std::ops::RangeInclusive<u32> = 1000..=4000;
const MASS_PER_SIZE: f64 = 50.0;
const MIN_SOFTENING_DIST: f64 = 10.0;
const SPAWN_MARGIN: f64 = 0.1;

/// Below this raw separation a pair exerts no force at all.
const CUTOFF_DIST: f64 = 1.0;

/// Pairwise `G / max(dist², min_dist_sq)` for every unordered pair, stored as
/// the strict upper triangle in one flat buffer.
#[derive(Clone, Debug)]
pub struct GravitationFactors {
    n: usize,
    data: Vec<f64>,
}

impl GravitationFactors {
    fn new(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n.saturating_sub(1) / 2],
        }
    }

    fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i != j, "no self-interaction factor for body {i}");
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        lo * self.n - lo * (lo + 1) / 2 + (hi - lo - 1)
    }

    /// Factor for the pair, in either argument order.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[self.index(i, j)]
    }

    fn refresh(&mut self, positions: &[Vector2], min_dist_sq: f64) {
        let mut k = 0;
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                let dist_sq = positions[i].distance_squared_to(positions[j]);
                self.data[k] = G / dist_sq.max(min_dist_sq);
                k += 1;
            }
        }
    }
}

/// Columnar state of every star: index `i` is the same body in every array
/// for the lifetime of the value. A reset builds a new one.
#[derive(Clone, Debug)]
pub struct SimulationState {
    masses: Vec<f64>,
    sizes: Vec<f64>,
    positions: Vec<Vector2>,
    velocities: Vec<Vector2>,
    colors: Vec<Color>,
    factors: GravitationFactors,
    accelerations: Vec<Vector2>,
    min_dist_sq: f64,
}

impl SimulationState {
    /// Random masses, positions inside `bounds` (inset by 10% on each axis)
    /// and colours; everything at rest.
    pub fn new<R: Rng>(count: NonZeroUsize, bounds: Vector2, rng: &mut R) -> Self {
        let n = count.get();
        let scale = 4.0 / n as f64;

        let bodies: Vec<_> = (0..n)
            .map(|_| {
                let mass = rng.gen_range(MASS_RANGE) as f64 * scale;
                let pos = Vector2::new(
                    rng.gen_range(bounds.x * SPAWN_MARGIN..=bounds.x * (1.0 - SPAWN_MARGIN)),
                    rng.gen_range(bounds.y * SPAWN_MARGIN..=bounds.y * (1.0 - SPAWN_MARGIN)),
                );
                let color = Color::srgb_u8(rng.gen(), rng.gen(), rng.gen());
                (mass, pos, color)
            })
            .collect();

        Self::from_bodies(bodies)
    }

    /// Builds a state from explicit `(mass, position, color)` triples. Bodies
    /// are reordered heaviest first; velocities start at zero.
    ///
    /// Panics on an empty list or a non-positive mass.
    pub fn from_bodies(bodies: impl IntoIterator<Item = (f64, Vector2, Color)>) -> Self {
        let mut bodies: Vec<_> = bodies.into_iter().collect();
        assert!(!bodies.is_empty(), "a simulation needs at least one star");
        assert!(
            bodies.iter().all(|(m, _, _)| *m > 0.0),
            "star masses must be strictly positive"
        );

        // heavy stars first so lighter ones are drawn on top
        bodies.sort_by(|a, b| b.0.total_cmp(&a.0));

        let n = bodies.len();
        let mut masses = Vec::with_capacity(n);
        let mut positions = Vec::with_capacity(n);
        let mut colors = Vec::with_capacity(n);
        for (m, p, c) in bodies {
            masses.push(m);
            positions.push(p);
            colors.push(c);
        }

        let sizes: Vec<f64> = masses.iter().map(|m| m / MASS_PER_SIZE).collect();
        let largest = sizes.iter().copied().fold(MIN_SOFTENING_DIST, f64::max);

        let mut state = Self {
            masses,
            sizes,
            positions,
            velocities: vec![Vector2::ZERO; n],
            colors,
            factors: GravitationFactors::new(n),
            accelerations: vec![Vector2::ZERO; n],
            min_dist_sq: largest * largest,
        };
        state.refresh_factors();
        state.refresh_accelerations();
        state
    }

    /// One semi-implicit Euler step: velocities from the previous
    /// accelerations, positions from the new velocities, then forces for the
    /// new positions. `dt = 0` still recomputes the forces.
    pub fn advance(&mut self, dt: f64) {
        for (v, a) in self.velocities.iter_mut().zip(&self.accelerations) {
            *v += *a * dt;
        }
        for (p, v) in self.positions.iter_mut().zip(&self.velocities) {
            *p += *v * dt;
        }
        self.refresh_factors();
        self.refresh_accelerations();
    }

    fn refresh_factors(&mut self) {
        self.factors.refresh(&self.positions, self.min_dist_sq);
    }

    fn refresh_accelerations(&mut self) {
        for a in &mut self.accelerations {
            a.update(0.0, 0.0);
        }

        let n = self.positions.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let mut dir = self.positions[j] - self.positions[i];
                if dir.length() <= CUTOFF_DIST {
                    continue;
                }
                dir.normalize_ip();
                let f = self.factors.get(i, j);

                let mut toward_j = dir;
                toward_j.scale_to_length(self.masses[j] * f);
                self.accelerations[i] += toward_j;

                let mut toward_i = -dir;
                toward_i.scale_to_length(self.masses[i] * f);
                self.accelerations[j] += toward_i;
            }
        }
    }

    pub fn number_of_stars(&self) -> usize {
        self.masses.len()
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn sizes(&self) -> &[f64] {
        &self.sizes
    }

    pub fn positions(&self) -> &[Vector2] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vector2] {
        &self.velocities
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn accelerations(&self) -> &[Vector2] {
        &self.accelerations
    }

    pub fn factors(&self) -> &GravitationFactors {
        &self.factors
    }

    pub fn min_dist_sq(&self) -> f64 {
        self.min_dist_sq
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn star(mass: f64, x: f64, y: f64) -> (f64, Vector2, Color) {
        (mass, Vector2::new(x, y), Color::WHITE)
    }

    fn random_state(n: usize, seed: u64) -> SimulationState {
        let mut rng = StdRng::seed_from_u64(seed);
        SimulationState::new(
            NonZeroUsize::new(n).unwrap(),
            Vector2::new(1400.0, 900.0),
            &mut rng,
        )
    }

    fn assert_factors_match(state: &SimulationState) {
        let n = state.number_of_stars();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let d2 = state.positions()[i].distance_squared_to(state.positions()[j]);
                let expected = G / d2.max(state.min_dist_sq());
                let f = state.factors().get(i, j);
                assert!(f >= 0.0 && !f.is_nan());
                assert_relative_eq!(f, expected, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn random_construction_shapes() {
        for n in [1, 2, 7, 50] {
            let s = random_state(n, n as u64);
            assert_eq!(s.number_of_stars(), n);
            assert_eq!(s.masses().len(), n);
            assert_eq!(s.sizes().len(), n);
            assert_eq!(s.positions().len(), n);
            assert_eq!(s.velocities().len(), n);
            assert_eq!(s.colors().len(), n);
            assert_eq!(s.accelerations().len(), n);
            assert!(s.masses().windows(2).all(|w| w[0] >= w[1]));
            assert!(s.velocities().iter().all(|v| *v == Vector2::ZERO));
        }
    }

    #[test]
    fn random_masses_sizes_and_positions_in_range() {
        let n = 20;
        let s = random_state(n, 3);
        let scale = 4.0 / n as f64;
        for (m, size) in s.masses().iter().zip(s.sizes()) {
            assert!(*m >= 1000.0 * scale && *m <= 4000.0 * scale);
            assert_relative_eq!(*size, m / 50.0);
        }
        for p in s.positions() {
            assert!(p.x >= 140.0 - 1e-9 && p.x <= 1260.0 + 1e-9);
            assert!(p.y >= 90.0 - 1e-9 && p.y <= 810.0 + 1e-9);
        }
    }

    #[test]
    fn min_dist_sq_has_floor_of_ten() {
        // sizes 1 and 2, both below the floor
        let s = SimulationState::from_bodies([star(50.0, 0.0, 0.0), star(100.0, 50.0, 0.0)]);
        assert_eq!(s.min_dist_sq(), 100.0);

        // largest size 40
        let s = SimulationState::from_bodies([star(2000.0, 0.0, 0.0), star(100.0, 500.0, 0.0)]);
        assert_eq!(s.min_dist_sq(), 1600.0);
    }

    #[test]
    fn min_dist_sq_is_fixed_for_the_run() {
        let mut s = random_state(5, 11);
        let before = s.min_dist_sq();
        for _ in 0..50 {
            s.advance(0.05);
        }
        assert_eq!(s.min_dist_sq(), before);
    }

    #[test]
    fn bodies_are_sorted_with_their_attributes() {
        let red = Color::srgb_u8(255, 0, 0);
        let s = SimulationState::from_bodies([
            (100.0, Vector2::new(1.0, 1.0), Color::WHITE),
            (300.0, Vector2::new(3.0, 3.0), red),
            (200.0, Vector2::new(2.0, 2.0), Color::BLACK),
        ]);
        assert_eq!(s.masses(), &[300.0, 200.0, 100.0]);
        assert_eq!(s.positions()[0], Vector2::new(3.0, 3.0));
        assert_eq!(s.colors()[0], red);
        assert_eq!(s.positions()[2], Vector2::new(1.0, 1.0));
    }

    #[test]
    fn factors_match_positions_after_construction_and_steps() {
        let mut s = random_state(12, 42);
        assert_factors_match(&s);
        for _ in 0..10 {
            s.advance(0.016);
            assert_factors_match(&s);
        }
    }

    #[test]
    fn factor_lookup_is_symmetric() {
        let s = random_state(6, 5);
        for i in 0..6 {
            for j in (i + 1)..6 {
                assert_eq!(s.factors().get(i, j), s.factors().get(j, i));
            }
        }
    }

    #[test]
    fn zero_step_keeps_motion_but_recomputes_forces() {
        let mut s = SimulationState::from_bodies([star(2000.0, 100.0, 100.0), star(1000.0, 200.0, 100.0)]);
        s.advance(0.5);
        let positions = s.positions().to_vec();
        let velocities = s.velocities().to_vec();

        // stale derived data must be overwritten by the zero step
        s.factors.data.iter_mut().for_each(|f| *f = -1.0);
        s.accelerations.iter_mut().for_each(|a| a.update(9.0, 9.0));

        s.advance(0.0);
        assert_eq!(s.positions(), positions.as_slice());
        assert_eq!(s.velocities(), velocities.as_slice());
        assert_factors_match(&s);

        let fresh = s.clone();
        s.advance(0.0);
        assert_eq!(s.accelerations(), fresh.accelerations());
        assert_ne!(s.accelerations()[0], Vector2::new(9.0, 9.0));
    }

    #[test]
    fn mirrored_equal_masses_have_opposite_accelerations() {
        let s = SimulationState::from_bodies([star(1500.0, -80.0, 30.0), star(1500.0, 80.0, -30.0)]);
        let a = s.accelerations();
        assert!(a[0].length() > 0.0);
        assert_abs_diff_eq!(a[0], -a[1], epsilon = 1e-12);
        assert_relative_eq!(a[0].length(), a[1].length(), max_relative = 1e-12);
    }

    #[test]
    fn acceleration_uses_the_other_bodys_mass() {
        let s = SimulationState::from_bodies([star(3000.0, 0.0, 0.0), star(1000.0, 300.0, 0.0)]);
        let f = G / (300.0 * 300.0);
        assert_relative_eq!(s.accelerations()[0].x, 1000.0 * f, max_relative = 1e-12);
        assert_relative_eq!(s.accelerations()[1].x, -3000.0 * f, max_relative = 1e-12);
        assert_eq!(s.accelerations()[0].y, 0.0);
    }

    #[test]
    fn softening_floor_bounds_close_pairs() {
        // distance 5, size 40 -> floor of 1600 instead of 25
        let s = SimulationState::from_bodies([star(2000.0, 0.0, 0.0), star(2000.0, 5.0, 0.0)]);
        assert_relative_eq!(s.factors().get(0, 1), G / 1600.0);
        assert_relative_eq!(s.accelerations()[0].x, 2000.0 * G / 1600.0, max_relative = 1e-12);
    }

    #[test]
    fn near_coincident_pair_exerts_no_force() {
        for d in [0.0, 0.5, 1.0] {
            let s = SimulationState::from_bodies([star(4000.0, 10.0, 10.0), star(4000.0, 10.0 + d, 10.0)]);
            assert_eq!(s.accelerations()[0], Vector2::ZERO);
            assert_eq!(s.accelerations()[1], Vector2::ZERO);
            assert!(s.factors().get(0, 1) > 0.0);
        }
    }

    #[test]
    fn single_star_stays_put() {
        let mut s = SimulationState::from_bodies([star(1000.0, 42.0, 24.0)]);
        s.advance(0.1);
        assert_eq!(s.positions()[0], Vector2::new(42.0, 24.0));
        assert_eq!(s.accelerations()[0], Vector2::ZERO);
    }

    #[test]
    fn one_step_pulls_pair_together() {
        let mut s = SimulationState::from_bodies([star(2000.0, 100.0, 100.0), star(1000.0, 200.0, 100.0)]);
        let acc = s.accelerations().to_vec();

        s.advance(0.01);

        let v = s.velocities();
        assert!(v[0].x > 0.0);
        assert!(v[1].x < 0.0);
        assert_abs_diff_eq!(v[0], acc[0] * 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(v[1], acc[1] * 0.01, epsilon = 1e-12);

        // positions use the velocity from this same step
        let p = s.positions();
        assert_abs_diff_eq!(p[0], Vector2::new(100.0, 100.0) + v[0] * 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(p[1], Vector2::new(200.0, 100.0) + v[1] * 0.01, epsilon = 1e-12);
    }

    #[test]
    #[should_panic(expected = "at least one star")]
    fn empty_body_list_is_rejected() {
        SimulationState::from_bodies(std::iter::empty());
    }

    #[test]
    #[should_panic(expected = "strictly positive")]
    fn non_positive_mass_is_rejected() {
        SimulationState::from_bodies([star(0.0, 0.0, 0.0)]);
    }
}
