//! Gesture core for a long-press, drag-to-select popup menu.
//!
//! [`menu::DraggableMenu`] owns the state machine. Layout collaborators
//! report boxes through its `register_*` calls, the platform feeds pointer
//! samples, and renderers read [`menu::MenuFrame`] snapshots.

pub mod anim;
pub mod config;
pub mod events;
pub mod gui;
pub mod menu;
pub mod sys;

pub use dragmenu_geom as geom;
