//! Core library for the `volley` CLI.
//!
//! A [`work::Work`] dispatches `N` copies of one request across `C`
//! concurrent workers, streams every outcome through a bounded channel to a
//! [`report::Reporter`], and supports cooperative mid-run cancellation.
pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod report;
pub mod work;

#[cfg(test)]
mod test_support;
