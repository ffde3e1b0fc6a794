//! Draft domain entities.

pub mod model;
pub mod state;

pub use model::Draft;
pub use state::PublishState;
