use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use starfield_rs::{InputPlugin, SimPlugin, UiPlugin};

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(Msaa::Sample4)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "starfield-rs: n-body gravity".into(),
                resolution: (1400., 900.).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((SimPlugin, UiPlugin, InputPlugin))
        .add_systems(Startup, setup_camera)
        .run();
}

fn setup_camera(mut commands: Commands) {
    // stays at the origin; zoom and pan live in `starfield_rs::view::ViewTransform`
    commands.spawn(Camera2dBundle::default());
}
