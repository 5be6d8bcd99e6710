pub mod controller;
pub mod state;

pub use controller::{ControllerConfig, RevealController};
pub use state::{RevealPhase, RevealState};
