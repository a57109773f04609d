mod movement;
mod stock;

pub use movement::*;
pub use stock::*;
