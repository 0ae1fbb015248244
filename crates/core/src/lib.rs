#![deny(unsafe_code)]
//! Core types and traits for the plexus background-effect engine.
//!
//! Provides the [`Effect`] and [`Surface`] traits, the [`Rgba`] color type,
//! the [`Xorshift64`] PRNG, the frame-loop [`Driver`] with its
//! [`StopHandle`], the reproducible [`Recipe`] render spec, and JSON
//! parameter helpers.

pub mod color;
pub mod driver;
pub mod effect;
pub mod error;
pub mod params;
pub mod prng;
pub mod recipe;
pub mod surface;

pub use color::Rgba;
pub use driver::{Driver, StopHandle};
pub use effect::Effect;
pub use error::EffectError;
pub use prng::Xorshift64;
pub use recipe::Recipe;
pub use surface::Surface;
