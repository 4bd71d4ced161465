//! Client for the megaverse grid service: places and removes polyanets,
//! soloons and comeths, and validates the current grid against the goal.

pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod models;
