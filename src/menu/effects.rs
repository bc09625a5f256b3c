//! Secondary motion around the gesture: menu enter/exit, item feedback,
//! the stretch squash and the shrinking anchor. None of it feeds back into
//! hit testing.

use super::exclusion::Placement;
use super::hit_test::HoveredItem;
use crate::anim::{
    Animatable, DAMPING_RATIO_LOW_BOUNCY, STIFFNESS_LOW, STIFFNESS_MEDIUM_LOW, SpringSpec,
};
use dragmenu_geom::{Point, Rect};
use std::time::Duration;

pub fn enter_spring() -> SpringSpec {
    SpringSpec::new(DAMPING_RATIO_LOW_BOUNCY - 0.05, STIFFNESS_MEDIUM_LOW - 50.0)
}

pub fn exit_spring() -> SpringSpec {
    SpringSpec::low_bouncy()
}

/// Scale applied to the whole menu surface around `origin`, where `origin` is
/// a fraction of the menu box (0,0 top-left, 1,1 bottom-right).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchTransform {
    pub scale_x: f32,
    pub scale_y: f32,
    pub origin: Point,
}

impl StretchTransform {
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
        origin: Point { x: 0.5, y: 0.5 },
    };

    /// Stretching up grows the menu from its bottom edge, stretching down
    /// from its top edge; both narrow it slightly.
    pub fn new(stretching_up: bool, stretching_down: bool, factor: f32, amount: f32) -> Self {
        let origin = if stretching_up {
            Point::new(0.5, 1.0)
        } else if stretching_down {
            Point::new(0.5, 0.0)
        } else {
            return Self::IDENTITY;
        };
        Self {
            scale_x: 1.0 - amount * factor,
            scale_y: 1.0 + amount * factor,
            origin,
        }
    }
}

/// Vertical nudge of the hovered item towards the pointer. Pulling up is
/// damped to a quarter of pulling down.
pub fn item_nudge(hovered: &HoveredItem) -> f32 {
    if hovered.is_none() || hovered.height <= 0.0 {
        return 0.0;
    }
    let half = hovered.height / 2.0;
    let mut fraction = (hovered.pointer_offset_from_top - half) / half;
    if hovered.pointer_offset_from_top <= half {
        fraction /= 4.0;
    }
    fraction.clamp(-1.0, 1.0) * hovered.height / 10.0
}

/// Transform pivot for the enter/exit scale: the anchor center expressed as
/// a fraction of the menu box.
pub fn enter_pivot(anchor: Rect, menu: Rect) -> Point {
    if menu.width <= 0.0 || menu.height <= 0.0 {
        return Point::new(0.5, 0.5);
    }
    let center = anchor.center();
    Point::new(
        ((center.x - menu.x) / menu.width).clamp(0.0, 1.0),
        ((center.y - menu.y) / menu.height).clamp(0.0, 1.0),
    )
}

/// The anchor gets out of the way when the user drags the menu towards it.
pub fn should_hide_anchor(
    placement: Option<Placement>,
    stretching_up: bool,
    stretching_down: bool,
    factor: f32,
    threshold: f32,
) -> bool {
    match placement {
        Some(Placement::Above) => stretching_down && factor > threshold,
        Some(Placement::Below) => stretching_up && factor > threshold,
        _ => false,
    }
}

#[derive(Debug, Clone)]
struct ItemVisual {
    hover_scale: Animatable,
    nudge: Animatable,
    press_scale: Animatable,
}

impl Default for ItemVisual {
    fn default() -> Self {
        Self {
            hover_scale: Animatable::new(1.0),
            nudge: Animatable::new(0.0),
            press_scale: Animatable::new(1.0),
        }
    }
}

impl ItemVisual {
    fn step(&mut self, dt: Duration) -> bool {
        let a = self.hover_scale.step(dt);
        let b = self.nudge.step(dt);
        let c = self.press_scale.step(dt);
        a || b || c
    }

    fn scale(&self) -> f32 {
        self.hover_scale.value() * self.press_scale.value()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemFrame {
    pub scale: f32,
    pub offset_y: f32,
}

#[derive(Debug, Clone)]
pub struct MenuVisuals {
    menu_scale: Animatable,
    anchor_scale: Animatable,
    anchor_hidden: bool,
    hovered: Option<usize>,
    pressed: Option<usize>,
    items: Vec<ItemVisual>,
    hovered_scale: f32,
    pressed_scale: f32,
}

impl MenuVisuals {
    pub fn new(hovered_scale: f32, pressed_scale: f32) -> Self {
        Self {
            menu_scale: Animatable::new(0.0),
            anchor_scale: Animatable::new(1.0),
            anchor_hidden: false,
            hovered: None,
            pressed: None,
            items: Vec::new(),
            hovered_scale,
            pressed_scale,
        }
    }

    pub fn menu_scale(&self) -> f32 {
        self.menu_scale.value()
    }

    pub fn anchor_scale(&self) -> f32 {
        self.anchor_scale.value()
    }

    pub fn enter(&mut self) {
        self.menu_scale.animate_to(1.0, enter_spring());
    }

    pub fn exit(&mut self) {
        self.menu_scale.animate_to(0.0, exit_spring());
    }

    pub fn ensure_items(&mut self, count: usize) {
        if self.items.len() < count {
            self.items.resize_with(count, ItemVisual::default);
        }
    }

    pub fn on_hover(&mut self, hovered: &HoveredItem) {
        if self.hovered != hovered.index {
            if let Some(old) = self.hovered.and_then(|i| self.items.get_mut(i)) {
                old.hover_scale
                    .animate_to(1.0, SpringSpec::new(DAMPING_RATIO_LOW_BOUNCY, STIFFNESS_LOW));
                old.nudge.animate_to(0.0, SpringSpec::default());
            }
            if let Some(new) = hovered.index.and_then(|i| self.items.get_mut(i)) {
                new.hover_scale
                    .animate_to(self.hovered_scale, SpringSpec::default());
            }
            self.hovered = hovered.index;
        }
        if let Some(item) = hovered.index.and_then(|i| self.items.get_mut(i)) {
            item.nudge.snap_to(item_nudge(hovered));
        }
    }

    /// Re-targets the anchor scale only when the decision flips.
    pub fn set_anchor_hidden(&mut self, hidden: bool) {
        if self.anchor_hidden == hidden {
            return;
        }
        self.anchor_hidden = hidden;
        self.anchor_scale.stop();
        self.anchor_scale
            .animate_to(if hidden { 0.0 } else { 1.0 }, SpringSpec::low_bouncy());
    }

    pub fn press(&mut self, index: Option<usize>) {
        self.release_press();
        if let Some(item) = index.and_then(|i| self.items.get_mut(i)) {
            item.press_scale
                .animate_to(self.pressed_scale, SpringSpec::default());
        }
        self.pressed = index;
    }

    pub fn release_press(&mut self) {
        if let Some(item) = self.pressed.take().and_then(|i| self.items.get_mut(i)) {
            item.press_scale.animate_to(1.0, SpringSpec::default());
        }
    }

    /// Session over: hover feedback and the anchor return to rest. Press
    /// feedback is left to finish on its own.
    pub fn end_session(&mut self) {
        self.on_hover(&HoveredItem::NONE);
        self.set_anchor_hidden(false);
        self.exit();
    }

    pub fn step(&mut self, dt: Duration) -> bool {
        let mut running = self.menu_scale.step(dt);
        running |= self.anchor_scale.step(dt);
        for item in &mut self.items {
            running |= item.step(dt);
        }
        running
    }

    pub fn is_animating(&self) -> bool {
        self.menu_scale.is_running()
            || self.anchor_scale.is_running()
            || self.items.iter().any(|item| {
                item.hover_scale.is_running()
                    || item.nudge.is_running()
                    || item.press_scale.is_running()
            })
    }

    pub fn item_frames(&self) -> Vec<ItemFrame> {
        self.items
            .iter()
            .map(|item| ItemFrame {
                scale: item.scale(),
                offset_y: item.nudge.value(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn settle(visuals: &mut MenuVisuals) {
        let mut frames = 0;
        while visuals.step(FRAME) {
            frames += 1;
            assert!(frames < 2_000);
        }
    }

    #[test]
    fn test_stretch_transform() {
        assert_eq!(StretchTransform::new(false, false, 0.7, 0.05), StretchTransform::IDENTITY);

        let up = StretchTransform::new(true, false, 1.0, 0.05);
        assert_eq!(up.origin, Point::new(0.5, 1.0));
        assert!((up.scale_x - 0.95).abs() < 1e-6);
        assert!((up.scale_y - 1.05).abs() < 1e-6);

        let down = StretchTransform::new(false, true, 0.5, 0.05);
        assert_eq!(down.origin, Point::new(0.5, 0.0));
        assert!((down.scale_y - 1.025).abs() < 1e-6);
    }

    #[test]
    fn test_item_nudge() {
        assert_eq!(item_nudge(&HoveredItem::new(1, 48.0, 24.0)), 0.0);
        // bottom edge pulls a full tenth of the height
        assert!((item_nudge(&HoveredItem::new(1, 48.0, 48.0)) - 4.8).abs() < 1e-5);
        // top edge pulls only a quarter of that
        assert!((item_nudge(&HoveredItem::new(1, 48.0, 0.0)) + 1.2).abs() < 1e-5);
        // stretch zone stays clamped
        assert!((item_nudge(&HoveredItem::new(4, 48.0, 500.0)) - 4.8).abs() < 1e-5);
        assert_eq!(item_nudge(&HoveredItem::NONE), 0.0);
    }

    #[test]
    fn test_enter_pivot_clamps() {
        let menu = Rect::new(100.0, 100.0, 200.0, 200.0);
        let inside = enter_pivot(Rect::new(190.0, 190.0, 20.0, 20.0), menu);
        assert_eq!(inside, Point::new(0.5, 0.5));
        let below = enter_pivot(Rect::new(0.0, 500.0, 20.0, 20.0), menu);
        assert_eq!(below, Point::new(0.0, 1.0));
    }

    #[test]
    fn test_should_hide_anchor() {
        assert!(should_hide_anchor(Some(Placement::Above), false, true, 0.2, 0.1));
        assert!(!should_hide_anchor(Some(Placement::Above), true, false, 0.2, 0.1));
        assert!(!should_hide_anchor(Some(Placement::Above), false, true, 0.05, 0.1));
        assert!(should_hide_anchor(Some(Placement::Below), true, false, 0.5, 0.1));
        assert!(!should_hide_anchor(Some(Placement::Overlapping), true, true, 1.0, 0.1));
        assert!(!should_hide_anchor(None, true, true, 1.0, 0.1));
    }

    #[test]
    fn test_hover_scales_and_releases() {
        let mut visuals = MenuVisuals::new(1.1, 0.9);
        visuals.ensure_items(3);
        visuals.on_hover(&HoveredItem::new(1, 48.0, 24.0));
        settle(&mut visuals);
        assert_eq!(visuals.item_frames()[1].scale, 1.1);
        assert_eq!(visuals.item_frames()[0].scale, 1.0);

        visuals.on_hover(&HoveredItem::new(2, 48.0, 24.0));
        settle(&mut visuals);
        assert_eq!(visuals.item_frames()[1].scale, 1.0);
        assert_eq!(visuals.item_frames()[2].scale, 1.1);
    }

    #[test]
    fn test_press_feedback_survives_end_session() {
        let mut visuals = MenuVisuals::new(1.1, 0.9);
        visuals.ensure_items(2);
        visuals.press(Some(0));
        settle(&mut visuals);
        assert!((visuals.item_frames()[0].scale - 0.9).abs() < 1e-6);

        visuals.release_press();
        visuals.end_session();
        visuals.step(FRAME);
        assert!(visuals.item_frames()[0].scale > 0.9);
        settle(&mut visuals);
        assert_eq!(visuals.item_frames()[0].scale, 1.0);
    }

    #[test]
    fn test_anchor_hide_only_retargets_on_flip() {
        let mut visuals = MenuVisuals::new(1.1, 0.9);
        visuals.set_anchor_hidden(true);
        visuals.step(FRAME);
        let shrinking = visuals.anchor_scale();
        assert!(shrinking < 1.0);
        visuals.set_anchor_hidden(true);
        visuals.step(FRAME);
        assert!(visuals.anchor_scale() < shrinking);
        settle(&mut visuals);
        assert_eq!(visuals.anchor_scale(), 0.0);
    }
}
