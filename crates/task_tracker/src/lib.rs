pub mod cli;
pub mod interactive;
pub mod prompt;
pub mod render;
