mod config;
mod inbound;

pub use config::*;
pub use inbound::*;
