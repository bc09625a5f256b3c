use super::theme::MenuTheme;
use super::view::{self, Shape, SurfacePainter};
use crate::menu::MenuFrame;
use cairo::{Context, Format, ImageSurface};
use std::f64::consts::PI;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cairo error: {0}")]
    Cairo(#[from] cairo::Error),
    #[error("PNG export failed: {0}")]
    Png(#[from] cairo::IoError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Paints onto an in-memory ARGB image.
pub struct CairoPainter {
    surface: ImageSurface,
    cr: Context,
}

impl CairoPainter {
    pub fn new(width: i32, height: i32) -> Result<Self, RenderError> {
        let surface = ImageSurface::create(Format::ARgb32, width, height)?;
        let cr = Context::new(&surface)?;
        Ok(Self { surface, cr })
    }

    pub fn write_png(&self, path: &Path) -> Result<(), RenderError> {
        self.surface.flush();
        let mut file = fs_err::File::create(path)?;
        self.surface.write_to_png(&mut file)?;
        Ok(())
    }

    fn rounded_rect(&self, x: f64, y: f64, w: f64, h: f64, r: f64) {
        let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
        let cr = &self.cr;
        cr.new_sub_path();
        cr.arc(x + w - r, y + r, r, -PI / 2.0, 0.0);
        cr.arc(x + w - r, y + h - r, r, 0.0, PI / 2.0);
        cr.arc(x + r, y + h - r, r, PI / 2.0, PI);
        cr.arc(x + r, y + r, r, PI, 3.0 * PI / 2.0);
        cr.close_path();
    }
}

impl SurfacePainter for CairoPainter {
    type Error = cairo::Error;

    fn fill(&mut self, shape: &Shape) -> Result<(), cairo::Error> {
        let rect = shape.rect;
        let (x, y, w, h) = (
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
        );
        let radius = shape.radius as f64;
        let (r, g, b, a) = shape.color.into_components();

        // drop shadow, offset by elevation
        if shape.elevation > 0.0 {
            let drop = shape.elevation as f64 / 4.0;
            self.cr.set_source_rgba(0.0, 0.0, 0.0, 0.12 * a);
            self.rounded_rect(x, y + drop, w, h, radius);
            self.cr.fill()?;
        }

        self.cr.set_source_rgba(r, g, b, a);
        self.rounded_rect(x, y, w, h, radius);
        self.cr.fill()
    }
}

/// Renders one frame into a `width` x `height` PNG at `path`.
pub fn export_frame(
    frame: &MenuFrame,
    theme: &MenuTheme,
    width: i32,
    height: i32,
    path: &Path,
) -> Result<(), RenderError> {
    let mut painter = CairoPainter::new(width, height)?;
    view::draw(&mut painter, frame, theme)?;
    painter.write_png(path)?;
    log::info!("Wrote frame to {}", path.display());
    Ok(())
}
