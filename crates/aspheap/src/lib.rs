//! aspheap library: drives pooled parse-arena workloads for the CLI.

pub mod app;
pub mod config;
pub mod errors;
pub mod output;
pub mod workload;
