//! CLI argument types and their conversion into a [`WorkSpec`](crate::work::WorkSpec).
mod build;
mod cli;
mod parsers;


pub use cli::TesterArgs;
