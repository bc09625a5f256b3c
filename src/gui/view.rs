use super::theme::MenuTheme;
use crate::menu::MenuFrame;
use dragmenu_geom::{Point, Rect};
use palette::Srgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Surface,
    HoverBar,
}

/// One filled rounded rectangle, already transformed into screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub layer: Layer,
    pub rect: Rect,
    pub radius: f32,
    pub color: Srgba<f64>,
    pub elevation: f32,
}

/// Whatever actually puts pixels somewhere.
pub trait SurfacePainter {
    type Error;

    fn fill(&mut self, shape: &Shape) -> Result<(), Self::Error>;
}

/// Scales `rect` by (`sx`, `sy`) around `pivot`.
fn scale_about(rect: Rect, pivot: Point, sx: f32, sy: f32) -> Rect {
    Rect::new(
        pivot.x + (rect.x - pivot.x) * sx,
        pivot.y + (rect.y - pivot.y) * sy,
        rect.width * sx,
        rect.height * sy,
    )
}

fn fraction_of(rect: Rect, at: Point) -> Point {
    Point::new(rect.x + rect.width * at.x, rect.y + rect.height * at.y)
}

fn fade(color: Srgba<f64>, by: f32) -> Srgba<f64> {
    let mut color = color;
    color.alpha *= by.clamp(0.0, 1.0) as f64;
    color
}

/// Resolves a frame into paint order: menu surface first, hover bar on top.
pub fn layout(frame: &MenuFrame, theme: &MenuTheme) -> Vec<Shape> {
    let (Some(menu), Some(content)) = (frame.menu, frame.content) else {
        return Vec::new();
    };
    if frame.is_hidden() || frame.menu_scale <= 0.0 {
        return Vec::new();
    }

    let stretch = frame.stretch;
    let stretch_origin = fraction_of(menu, stretch.origin);
    let pivot = fraction_of(menu, frame.pivot);
    let place = |rect: Rect| {
        let stretched = scale_about(rect, stretch_origin, stretch.scale_x, stretch.scale_y);
        scale_about(stretched, pivot, frame.menu_scale, frame.menu_scale)
    };

    let mut shapes = vec![Shape {
        layer: Layer::Surface,
        rect: place(content),
        radius: theme.corner_radius * frame.menu_scale,
        color: fade(theme.surface, frame.menu_alpha),
        elevation: theme.elevation,
    }];

    let bar = frame
        .hover_bar
        .bounds(content, menu.origin(), theme.hover_bar_inset);
    if let Some(bar) = bar {
        shapes.push(Shape {
            layer: Layer::HoverBar,
            rect: place(bar),
            radius: theme.corner_radius / 2.0 * frame.menu_scale,
            color: fade(theme.hover_bar, frame.menu_alpha * frame.hover_bar.visibility),
            elevation: theme.hover_bar_elevation,
        });
    }
    shapes
}

pub fn draw<P: SurfacePainter>(
    painter: &mut P,
    frame: &MenuFrame,
    theme: &MenuTheme,
) -> Result<(), P::Error> {
    for shape in layout(frame, theme) {
        painter.fill(&shape)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::effects::StretchTransform;
    use crate::menu::HoverBarFrame;

    fn settled_frame() -> MenuFrame {
        MenuFrame {
            open: true,
            menu: Some(Rect::new(100.0, 400.0, 200.0, 272.0)),
            content: Some(Rect::new(124.0, 416.0, 152.0, 240.0)),
            menu_scale: 1.0,
            menu_alpha: 1.0,
            pivot: Point::new(0.5, 1.0),
            stretch: StretchTransform::IDENTITY,
            anchor_scale: 1.0,
            hovered_index: Some(2),
            hover_bar: HoverBarFrame {
                offset: 112.0,
                height: 48.0,
                visibility: 1.0,
            },
            items: Vec::new(),
        }
    }

    #[derive(Default)]
    struct Recorder {
        shapes: Vec<Shape>,
    }

    impl SurfacePainter for Recorder {
        type Error = ();

        fn fill(&mut self, shape: &Shape) -> Result<(), ()> {
            self.shapes.push(*shape);
            Ok(())
        }
    }

    #[test]
    fn test_surface_then_hover_bar() {
        let mut recorder = Recorder::default();
        draw(&mut recorder, &settled_frame(), &MenuTheme::default()).unwrap();

        let layers: Vec<_> = recorder.shapes.iter().map(|s| s.layer).collect();
        assert_eq!(layers, vec![Layer::Surface, Layer::HoverBar]);
        assert_eq!(recorder.shapes[0].rect, Rect::new(124.0, 416.0, 152.0, 240.0));
        assert_eq!(recorder.shapes[1].rect, Rect::new(116.0, 512.0, 168.0, 48.0));
    }

    #[test]
    fn test_no_hover_bar_without_hover() {
        let mut frame = settled_frame();
        frame.hover_bar.visibility = 0.0;
        let shapes = layout(&frame, &MenuTheme::default());
        assert_eq!(shapes.len(), 1);
    }

    #[test]
    fn test_hidden_frame_draws_nothing() {
        let mut frame = settled_frame();
        frame.open = false;
        frame.menu_scale = 0.0;
        frame.menu_alpha = 0.0;
        assert!(layout(&frame, &MenuTheme::default()).is_empty());

        let mut frame = settled_frame();
        frame.menu = None;
        assert!(layout(&frame, &MenuTheme::default()).is_empty());
    }

    #[test]
    fn test_enter_scale_shrinks_towards_pivot() {
        let mut frame = settled_frame();
        frame.menu_scale = 0.5;
        frame.menu_alpha = 0.5;
        let shapes = layout(&frame, &MenuTheme::default());
        let surface = shapes[0];
        // pivot is the bottom-center of the menu box: (200, 672)
        assert_eq!(surface.rect, Rect::new(162.0, 544.0, 76.0, 120.0));
        assert!((surface.color.alpha - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_stretch_up_grows_from_bottom() {
        let mut frame = settled_frame();
        frame.stretch = StretchTransform::new(true, false, 1.0, 0.05);
        let shapes = layout(&frame, &MenuTheme::default());
        let surface = shapes[0].rect;
        // the bottom edge stays put while the top rises
        assert!((surface.bottom() - (672.0 - 16.0 * 1.05)).abs() < 1e-3);
        assert!(surface.top() < 416.0);
        assert!(surface.width < 152.0);
    }
}
