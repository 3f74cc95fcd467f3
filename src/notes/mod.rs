pub mod commands;
mod store;
pub mod types;

pub use store::NoteStore;
