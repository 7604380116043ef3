use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::sim::{ResetEvent, SimSettings, Simulation, MAX_STARS};
use crate::view::ViewTransform;

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin).add_systems(Update, ui_system);
    }
}

fn ui_system(
    mut contexts: EguiContexts,
    mut settings: ResMut<SimSettings>,
    mut view: ResMut<ViewTransform>,
    mut ev_reset: EventWriter<ResetEvent>,
    sim: Option<Res<Simulation>>,
    diagnostics: Res<DiagnosticsStore>,
) {
    egui::Window::new("Stars").show(contexts.ctx_mut(), |ui| {
        if let Some(sim) = sim.as_deref() {
            ui.label(format!("Stars: {}", sim.number_of_stars()));
        }
        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                ui.label(format!("FPS: {:.1}", value));
            }
        }
        ui.label(format!("Zoom: {:.2}x", view.scale));

        ui.separator();

        ui.checkbox(&mut settings.running, "Running");
        ui.add(
            egui::Slider::new(&mut settings.number_of_stars, 1..=MAX_STARS)
                .text("Stars on reset"),
        );
        ui.checkbox(&mut settings.deterministic, "Deterministic");

        ui.horizontal(|ui| {
            if ui.button("Reset").clicked() {
                ev_reset.send(ResetEvent);
            }
            if ui.button("Reset view").clicked() {
                *view = ViewTransform::default();
            }
        });
    });

    if settings.show_help {
        egui::Window::new("Help").show(contexts.ctx_mut(), |ui| {
            ui.label("Space/P: Pause Simulation");
            ui.label("R: Reset Simulation");
            ui.label("+/-, Mouse Wheel: Zoom");
            ui.label("Arrows/WASD: Pan");
            ui.label("Right Mouse: Pan (drag)");
            ui.label("Home: Reset View");
            ui.label("H: Toggle Help");
            ui.label("F3: Toggle Diagnostics");
        });
    }

    if settings.show_diagnostics {
        egui::Window::new("Diagnostics").show(contexts.ctx_mut(), |ui| {
            if let Some(frame_time) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FRAME_TIME) {
                if let Some(value) = frame_time.smoothed() {
                    ui.label(format!("Frame time: {:.2} ms", value));
                }
            }
            if let Some(sim) = sim.as_deref() {
                let kinetic: f64 = sim
                    .masses()
                    .iter()
                    .zip(sim.velocities())
                    .map(|(m, v)| 0.5 * m * v.length_squared())
                    .sum();
                ui.label(format!("Kinetic energy: {:.3e}", kinetic));
            }
        });
    }
}
