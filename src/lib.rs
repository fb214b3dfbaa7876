pub mod config;
pub mod dashboard;
pub mod error;
pub mod fixture;
pub mod http_client;
pub mod model;
pub mod outcome;
pub mod predict;
pub mod season;
pub mod standings;
pub mod store;
pub mod strengths;

pub use error::{LeagueError, Result};
