mod component;
mod encode;
mod error;
mod graph;
mod interaction;
mod labels;
mod render;
mod scene;
mod simulation;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use types::{ForceGraphConfig, GraphDocument};
