use super::effects::{ItemFrame, StretchTransform};
use dragmenu_geom::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverBarFrame {
    /// Menu-local top edge.
    pub offset: f32,
    pub height: f32,
    pub visibility: f32,
}

impl HoverBarFrame {
    /// Screen-space box of the bar inside `content`, or `None` while hidden.
    pub fn bounds(&self, content: Rect, menu_origin: Point, inset: f32) -> Option<Rect> {
        if self.visibility <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Rect::new(
            content.x - inset,
            menu_origin.y + self.offset,
            content.width + 2.0 * inset,
            self.height,
        ))
    }
}

/// One frame's worth of animated state, ready for a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuFrame {
    pub open: bool,
    /// Screen-space menu box.
    pub menu: Option<Rect>,
    /// Screen-space padded content box.
    pub content: Option<Rect>,
    pub menu_scale: f32,
    pub menu_alpha: f32,
    /// Enter/exit transform origin as a fraction of the menu box.
    pub pivot: Point,
    pub stretch: StretchTransform,
    pub anchor_scale: f32,
    pub hovered_index: Option<usize>,
    pub hover_bar: HoverBarFrame,
    pub items: Vec<ItemFrame>,
}

impl MenuFrame {
    /// Nothing left to draw: closed and fully faded out.
    pub fn is_hidden(&self) -> bool {
        !self.open && self.menu_alpha <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hover_bar_bounds() {
        let bar = HoverBarFrame {
            offset: 64.0,
            height: 48.0,
            visibility: 1.0,
        };
        let content = Rect::new(124.0, 416.0, 152.0, 240.0);
        let bounds = bar.bounds(content, Point::new(100.0, 400.0), 8.0);
        assert_eq!(bounds, Some(Rect::new(116.0, 464.0, 168.0, 48.0)));

        let hidden = HoverBarFrame {
            visibility: 0.0,
            ..bar
        };
        assert_eq!(hidden.bounds(content, Point::new(100.0, 400.0), 8.0), None);
    }
}
