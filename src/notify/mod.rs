//! Result output.

mod console;

pub use console::ConsoleOutput;
