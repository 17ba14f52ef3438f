pub mod grid_world;

pub use grid_world::{Action, Difficulty, GridConfig, GridWorld, Pos};
