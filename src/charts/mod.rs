//! Charts module - State map selection and rendering

mod renderer;
mod state_map;

pub use renderer::{Boundaries, RenderError, StaticMapRenderer};
pub use state_map::{known_states, MapError, StateMap, StateMapper};
