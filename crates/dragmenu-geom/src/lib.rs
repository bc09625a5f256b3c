//! Plain geometry shared by the menu core and its collaborators.
//!
//! Everything here is in one root coordinate space with `y` growing
//! downwards, the same space pointer samples arrive in.

pub mod shape;
pub mod triangle;

pub use shape::{Insets, Point, Rect, Size};
pub use triangle::point_in_triangle;
