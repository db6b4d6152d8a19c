mod coord;
mod network;

pub use coord::*;
pub use network::*;
