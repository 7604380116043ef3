use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::WindowResized;

use crate::sim::{ResetEvent, SimSettings};
use crate::view::{ViewTransform, Viewport, PAN_STEP_PX, ZOOM_STEP};

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                track_viewport,
                zoom_controls,
                pan_controls,
                view_reset,
                pause_toggle,
                reset_trigger,
                help_toggle,
                diagnostics_toggle,
            ),
        );
    }
}

fn track_viewport(mut resized: EventReader<WindowResized>, mut viewport: ResMut<Viewport>) {
    // only the last size of the frame matters
    if let Some(ev) = resized.read().last() {
        viewport.width = ev.width;
        viewport.height = ev.height;
        debug!("viewport resized to {}x{}", ev.width, ev.height);
    }
}

fn zoom_controls(
    mut scroll_evr: EventReader<MouseWheel>,
    keys: Res<ButtonInput<KeyCode>>,
    mut view: ResMut<ViewTransform>,
) {
    for ev in scroll_evr.read() {
        let notches = match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y / 40.0,
        };
        if notches != 0.0 {
            view.zoom_by(ZOOM_STEP.powf(notches));
        }
    }

    if keys.any_just_pressed([KeyCode::Equal, KeyCode::NumpadAdd]) {
        view.zoom_by(ZOOM_STEP);
        debug!("zoom {:.2}", view.scale);
    }
    if keys.any_just_pressed([KeyCode::Minus, KeyCode::NumpadSubtract]) {
        view.zoom_by(1.0 / ZOOM_STEP);
        debug!("zoom {:.2}", view.scale);
    }
}

fn pan_controls(
    keys: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut view: ResMut<ViewTransform>,
) {
    // screen space, y grows downwards
    let mut delta = Vec2::ZERO;
    if keys.any_just_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]) {
        delta.x += PAN_STEP_PX;
    }
    if keys.any_just_pressed([KeyCode::ArrowRight, KeyCode::KeyD]) {
        delta.x -= PAN_STEP_PX;
    }
    if keys.any_just_pressed([KeyCode::ArrowUp, KeyCode::KeyW]) {
        delta.y += PAN_STEP_PX;
    }
    if keys.any_just_pressed([KeyCode::ArrowDown, KeyCode::KeyS]) {
        delta.y -= PAN_STEP_PX;
    }

    if buttons.pressed(MouseButton::Right) {
        for m in motion.read() {
            delta += m.delta;
        }
    } else {
        motion.clear();
    }

    if delta != Vec2::ZERO {
        view.pan_by(delta);
    }
}

fn view_reset(keys: Res<ButtonInput<KeyCode>>, mut view: ResMut<ViewTransform>) {
    if keys.just_pressed(KeyCode::Home) {
        *view = ViewTransform::default();
    }
}

fn pause_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.any_just_pressed([KeyCode::Space, KeyCode::KeyP]) {
        settings.running = !settings.running;
        debug!("running: {}", settings.running);
    }
}

fn reset_trigger(mut ev_reset: EventWriter<ResetEvent>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyR) {
        ev_reset.send(ResetEvent);
    }
}

fn help_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyH) {
        settings.show_help = !settings.show_help;
    }
}

fn diagnostics_toggle(mut settings: ResMut<SimSettings>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::F3) {
        settings.show_diagnostics = !settings.show_diagnostics;
    }
}
