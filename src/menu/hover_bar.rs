use super::hit_test::HoveredItem;
use crate::anim::{Animatable, SpringSpec};
use dragmenu_geom::Rect;
use std::time::Duration;

/// Inputs for one hover-bar update, all in menu-local coordinates.
#[derive(Debug, Clone, Copy)]
pub struct BarTarget {
    pub hovered: HoveredItem,
    pub pointer_y: f32,
    /// Top edge of the hovered item, if its box is known.
    pub item_top: Option<f32>,
    /// Padded content box of the menu, if known.
    pub content: Option<Rect>,
}

/// How far the pointer has pulled above the first item, as a fraction of
/// the menu height.
pub fn stretch_up_factor(hovered: &HoveredItem, menu_height: f32) -> f32 {
    if menu_height <= 0.0 {
        return 0.0;
    }
    (-hovered.pointer_offset_from_top / menu_height).clamp(0.0, 1.0)
}

/// How far the pointer has pulled below the last item.
pub fn stretch_down_factor(hovered: &HoveredItem, menu_height: f32) -> f32 {
    if menu_height <= 0.0 {
        return 0.0;
    }
    ((hovered.pointer_offset_from_top - hovered.height) / menu_height).clamp(0.0, 1.0)
}

/// The highlight behind the hovered item.
///
/// Switching items springs the bar to the new item's top edge; staying on one
/// item lets the bar follow the finger directly, keeping the grab point
/// (`snapped_offset`) under the pointer.
#[derive(Debug, Clone, Default)]
pub struct HoverBar {
    height: Animatable,
    offset: Animatable,
    visibility: Animatable,
    snapped_index: Option<usize>,
    snapped_offset: f32,
    snap_in_flight: bool,
    last_pointer_y: f32,
}

impl HoverBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn height(&self) -> f32 {
        self.height.value()
    }

    pub fn offset(&self) -> f32 {
        self.offset.value()
    }

    pub fn visibility(&self) -> f32 {
        self.visibility.value()
    }

    pub fn snapped_index(&self) -> Option<usize> {
        self.snapped_index
    }

    pub fn snapped_offset(&self) -> f32 {
        self.snapped_offset
    }

    pub fn is_animating(&self) -> bool {
        self.height.is_running() || self.offset.is_running() || self.visibility.is_running()
    }

    pub fn update(&mut self, target: BarTarget) {
        let hovered = target.hovered;
        self.last_pointer_y = target.pointer_y;

        if self.height.target().round() != hovered.height.round() {
            self.height.stop();
            if self.height.value() == 0.0 {
                self.height.snap_to(hovered.height);
            } else {
                self.height.animate_to(hovered.height, SpringSpec::default());
            }
        }

        let show = if hovered.is_none() { 0.0 } else { 1.0 };
        if self.visibility.target() != show {
            self.visibility.animate_to(show, SpringSpec::low_bouncy());
        }

        if self.snapped_index != hovered.index {
            self.snapped_index = hovered.index;
            if let Some(top) = target.item_top {
                self.offset.stop();
                self.offset.animate_to(top, SpringSpec::default());
            }
            self.snap_in_flight = true;
            if !self.offset.is_running() {
                self.finish_snap();
            }
        } else if !self.offset.is_running() {
            self.follow_pointer(target.pointer_y, target.content);
        }
    }

    /// Overrides the grab point, used while stretching past the first or
    /// last item.
    pub fn pin_snapped_offset(&mut self, offset: f32) {
        self.snapped_offset = offset;
    }

    /// Advances the animations. Returns whether any is still running.
    pub fn step(&mut self, dt: Duration) -> bool {
        self.height.step(dt);
        self.visibility.step(dt);
        let offset_running = self.offset.step(dt);
        if self.snap_in_flight && !offset_running {
            self.finish_snap();
        }
        self.is_animating()
    }

    /// Snaps everything back to rest.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn finish_snap(&mut self) {
        self.snap_in_flight = false;
        self.snapped_offset = self.last_pointer_y - self.offset.value();
    }

    fn follow_pointer(&mut self, pointer_y: f32, content: Option<Rect>) {
        let Some(content) = content else {
            return;
        };
        let min = content.top();
        let max = content.bottom() - self.height.value();
        if max < min {
            return;
        }
        self.offset
            .snap_to((pointer_y - self.snapped_offset).clamp(min, max));
    }
}
