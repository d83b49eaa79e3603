pub mod bot;
pub mod calls;
pub mod catalog;
pub mod client;
pub mod combat;
pub mod config;
pub mod error;
pub mod monitor;
pub mod salt;
pub mod state;
pub mod strategy;

pub use bot::*;
pub use client::*;
pub use config::*;
pub use error::*;
pub use strategy::*;
