use dragmenu_geom::{Point, Rect, point_in_triangle};
use strum::Display;

/// Where the menu sits relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Placement {
    /// Menu bottom strictly above the anchor top.
    Above,
    /// Menu top strictly below the anchor bottom.
    Below,
    /// Anything else, including edges that touch. Both triangles apply.
    Overlapping,
}

impl Placement {
    pub fn classify(anchor: Rect, menu: Rect) -> Self {
        if menu.bottom() < anchor.top() {
            Self::Above
        } else if menu.top() > anchor.bottom() {
            Self::Below
        } else {
            Self::Overlapping
        }
    }

    /// The gap between the anchor and the menu's top edge needs bridging.
    fn bridges_top_edge(&self) -> bool {
        !matches!(self, Self::Above)
    }

    fn bridges_bottom_edge(&self) -> bool {
        !matches!(self, Self::Below)
    }
}

/// The region a drag may wander through without cancelling the gesture:
/// anchor box, menu column, and the two triangles joining the anchor center
/// to the near menu corners.
#[derive(Debug, Clone, Copy)]
pub struct InteractiveRegion {
    pub anchor: Option<Rect>,
    pub menu: Rect,
    pub placement: Placement,
    pub pointer_hovering: bool,
}

impl InteractiveRegion {
    pub fn is_outside(&self, p: Point) -> bool {
        if self.anchor.is_some_and(|anchor| anchor.contains(p)) {
            return false;
        }

        if let Some(anchor) = self.anchor {
            let apex = anchor.center();
            let menu = self.menu;
            if self.placement.bridges_top_edge()
                && point_in_triangle(p, apex, menu.top_left(), menu.top_right())
            {
                return false;
            }
            if self.placement.bridges_bottom_edge()
                && point_in_triangle(p, apex, menu.bottom_left(), menu.bottom_right())
            {
                return false;
            }
        }

        // Once hovered, the whole column above and below the menu stays live
        // for the stretch zones.
        !self.menu.contains_x(p.x)
            || (p.y < self.menu.top() && !self.pointer_hovering)
            || (p.y > self.menu.bottom() && !self.pointer_hovering)
    }
}
