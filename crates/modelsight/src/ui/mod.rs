pub mod console;
pub mod tracker;
