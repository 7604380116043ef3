//! Interactive 2D n-body star simulation.
//! - `state`: the integrator and the per-star arrays it owns.
//! - `sim`: frame-timed stepping, reset and star sprites.
//! - `view`, `input`, `ui`: viewport, controls and the egui panel.

pub mod input;
pub mod sim;
pub mod state;
pub mod ui;
pub mod vector2;
pub mod view;

pub use input::InputPlugin;
pub use sim::SimPlugin;
pub use ui::UiPlugin;
