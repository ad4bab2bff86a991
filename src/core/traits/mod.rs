pub mod command;
pub mod runner;
