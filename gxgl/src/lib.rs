//! Compiles fixed-function GL render state into GameCube/Wii GX hardware
//! configuration.
//!
//! A [Context] holds the abstract GL state. Setters record state and mark the
//! affected hardware categories dirty; before each draw,
//! [Context::compile_and_apply] re-emits the dirty categories as a stream of
//! [GxCommand](backend::GxCommand) values. Lighting is emulated with the two
//! color channels, texture environments and combine functions are rewritten
//! into TEV stages, and GL projection matrices are re-expressed in the GX depth
//! convention.
//!
//! Scarce hardware slots (TEV stages, texture coordinate generators, light
//! objects, ...) are handed out by a per-draw ledger. Features that do not fit
//! are dropped and reported as [Diagnostic](diag::Diagnostic) values.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::too_many_arguments, clippy::needless_range_loop)]

pub use context::*;
pub use error::*;
pub use glapi::*;
pub use setters::*;
pub use stages::{ExtraStages, NoExtraStages};
pub use texture::TextureObjects;

mod apply;
pub mod attributes;
pub mod backend;
pub mod combine;
pub mod config;
mod context;
pub mod diag;
pub mod dirty;
mod error;
pub mod gl;
mod glapi;
pub mod gx;
mod lighting;
pub mod lights;
pub mod matrix;
pub mod projection;
pub mod resources;
mod setters;
mod stages;
pub mod state;
mod texture;
