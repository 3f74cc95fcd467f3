mod autostart;
pub mod commands;
mod types;
