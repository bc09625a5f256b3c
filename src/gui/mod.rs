#[cfg(feature = "png")]
pub mod png;
pub mod theme;
pub mod view;

pub use theme::MenuTheme;
pub use view::{Layer, Shape, SurfacePainter, draw, layout};
