// Library exports for the route-planning Battlesnake
// The server, the decide tool and the replay tool all share the core logic

pub mod board;
pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod error;
pub mod map;
pub mod planner;
pub mod replay;
pub mod route;
pub mod types;
