use std::num::NonZeroUsize;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::state::SimulationState;
use crate::view::{ViewTransform, Viewport};

/// Longest step ever handed to the integrator. Frames after a stall (window
/// hidden, debugger break) are cut down to this.
pub const MAX_STEP_SECS: f64 = 0.1;

pub const MAX_STARS: usize = 1000;

pub fn clamp_step(delta_secs: f64) -> f64 {
    delta_secs.clamp(0.0, MAX_STEP_SECS)
}

pub struct SimPlugin;
impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimSettings>()
            .init_resource::<Viewport>()
            .init_resource::<ViewTransform>()
            .add_event::<ResetEvent>()
            .add_systems(Startup, init_simulation)
            .add_systems(
                Update,
                (handle_reset, step_simulation, sync_star_sprites).chain(),
            );
    }
}

#[derive(Resource, Clone, Debug)]
pub struct SimSettings {
    pub number_of_stars: usize,
    pub running: bool,
    pub deterministic: bool,
    pub show_help: bool,
    pub show_diagnostics: bool,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            number_of_stars: 4,
            running: true,
            deterministic: false,
            show_help: true,
            show_diagnostics: false,
        }
    }
}

impl SimSettings {
    /// Star count for the next reset, forced into `1..=MAX_STARS`.
    pub fn star_count(&self) -> NonZeroUsize {
        let n = self.number_of_stars.clamp(1, MAX_STARS);
        if n != self.number_of_stars {
            warn!(
                "star count {} out of range, using {}",
                self.number_of_stars, n
            );
        }
        NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
    }

    fn rng(&self) -> StdRng {
        if self.deterministic {
            StdRng::from_seed([0; 32])
        } else {
            StdRng::from_entropy()
        }
    }
}

#[derive(Resource, Deref, DerefMut)]
pub struct Simulation(pub SimulationState);

impl Simulation {
    pub fn from_settings(settings: &SimSettings, viewport: &Viewport) -> Self {
        let count = settings.star_count();
        let state = SimulationState::new(count, viewport.bounds(), &mut settings.rng());
        info!(
            "new simulation: {} stars in {}x{}",
            count, viewport.width, viewport.height
        );
        Self(state)
    }
}

/// Index of the body a sprite draws.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StarSprite(pub usize);

#[derive(Event, Default)]
pub struct ResetEvent;

fn spawn_star_sprites(commands: &mut Commands, state: &SimulationState) {
    for (i, color) in state.colors().iter().enumerate() {
        commands.spawn((
            StarSprite(i),
            SpriteBundle {
                sprite: Sprite {
                    color: *color,
                    ..default()
                },
                ..default()
            },
        ));
    }
}

pub fn init_simulation(
    mut commands: Commands,
    settings: Res<SimSettings>,
    mut viewport: ResMut<Viewport>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    if let Ok(win) = windows.get_single() {
        viewport.width = win.width();
        viewport.height = win.height();
    }

    let sim = Simulation::from_settings(&settings, &viewport);
    spawn_star_sprites(&mut commands, &sim);
    commands.insert_resource(sim);
}

pub fn handle_reset(
    mut commands: Commands,
    mut ev_reset: EventReader<ResetEvent>,
    sprites: Query<Entity, With<StarSprite>>,
    settings: Res<SimSettings>,
    viewport: Res<Viewport>,
) {
    if ev_reset.is_empty() {
        return;
    }
    ev_reset.clear();

    for e in &sprites {
        commands.entity(e).despawn_recursive();
    }

    let sim = Simulation::from_settings(&settings, &viewport);
    spawn_star_sprites(&mut commands, &sim);
    commands.insert_resource(sim);
}

pub fn step_simulation(
    time: Res<Time>,
    settings: Res<SimSettings>,
    sim: Option<ResMut<Simulation>>,
) {
    if !settings.running {
        return;
    }
    let Some(mut sim) = sim else {
        return;
    };
    sim.advance(clamp_step(time.delta_seconds_f64()));
}

pub fn sync_star_sprites(
    sim: Option<Res<Simulation>>,
    view: Res<ViewTransform>,
    viewport: Res<Viewport>,
    mut q: Query<(&StarSprite, &mut Transform, &mut Sprite)>,
) {
    let Some(sim) = sim else {
        return;
    };

    for (star, mut t, mut s) in &mut q {
        let Some((pos, size)) = sim.positions().get(star.0).zip(sim.sizes().get(star.0)) else {
            continue;
        };
        let world = viewport.screen_to_world(view.to_screen(*pos, &viewport));
        // later (lighter) stars on top
        t.translation = world.extend(star.0 as f32 * 1e-3);
        s.custom_size = Some(Vec2::splat(2.0 * view.visible_radius(*size)));
    }
}
