//! # aspheap-pool
//!
//! Recycled bump arenas for the build-language parser and interpreter.
//!
//! Short-lived arenas holding a handful of objects cost more than they save,
//! so a [`HeapPool`] keeps a fixed set of arenas alive across parses and
//! hands them out one checkout at a time. Arenas are freed when a slot has
//! been used too many times or left idle too long, and recreated lazily.
//!
//! The [`alloc`] helpers take an [`Allocator`], which is either a checked-out
//! slot's arena or the ordinary heap, so callers can run the same code with
//! or without a pool.
#![warn(missing_docs)]

pub mod alloc;
pub mod arena;
pub mod config;
pub mod error;
pub mod pool;
pub mod stats;

mod slot;
mod sweep;

pub use alloc::{append, make_slice, new_object, Allocator, Obj, Seq};
pub use config::PoolConfig;
pub use error::HeapError;
pub use pool::{HeapGuard, HeapPool};
pub use stats::HeapStats;
