//! Frame-driven spring animation.
//!
//! Values only move when [`Animatable::step`] is called, so whoever owns the
//! frame clock decides the pace. Nothing here knows about menus.

mod spring;

pub use spring::{Animatable, SpringSpec};

pub const DAMPING_RATIO_NO_BOUNCY: f32 = 1.0;
pub const DAMPING_RATIO_LOW_BOUNCY: f32 = 0.75;
pub const DAMPING_RATIO_MEDIUM_BOUNCY: f32 = 0.5;

pub const STIFFNESS_HIGH: f32 = 10_000.0;
pub const STIFFNESS_MEDIUM: f32 = 1_500.0;
pub const STIFFNESS_MEDIUM_LOW: f32 = 400.0;
pub const STIFFNESS_LOW: f32 = 200.0;
