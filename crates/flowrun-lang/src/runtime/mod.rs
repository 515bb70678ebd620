pub mod binops;
pub mod console;
pub mod environment;
pub mod interpreter;
pub mod value;
