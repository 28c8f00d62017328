pub mod actions;
pub mod config;
pub mod facts;
pub mod gate;
pub mod reducer;
pub mod state;

pub use actions::*;
pub use reducer::*;
pub use state::*;
