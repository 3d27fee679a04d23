mod commands;
pub mod keyboard;
pub mod parse;

pub use commands::Command;
pub use keyboard::handle_key_input;
