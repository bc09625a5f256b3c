use dragmenu_geom::{Insets, Point, Rect};
use parking_lot::RwLock;
use std::sync::Arc;

/// Last known box of one menu entry, in root space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemSlot {
    pub bounds: Rect,
    /// Cleared while the visual element is detached; the box is then stale.
    pub attached: bool,
}

impl ItemSlot {
    pub fn usable_bounds(&self) -> Option<Rect> {
        (self.attached && self.bounds.is_valid()).then_some(self.bounds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuGeometry {
    pub bounds: Rect,
    pub padding: Insets,
}

impl MenuGeometry {
    pub fn origin(&self) -> Point {
        self.bounds.origin()
    }

    /// Content box in menu-local coordinates.
    pub fn content_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.bounds.width, self.bounds.height).inset(self.padding)
    }
}

/// Everything the layout collaborator reports, written through explicit
/// `register_*` calls and read as whole snapshots.
#[derive(Debug, Clone, Default)]
pub struct GeometryRepository {
    items: Vec<Option<ItemSlot>>,
    anchor: Option<Rect>,
    menu: Option<MenuGeometry>,
    /// Bumped by every menu layout pass.
    menu_epoch: u64,
}

impl GeometryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Resizes the slot list. New slots start unregistered.
    pub fn register_item_count(&mut self, count: usize) {
        self.items.resize(count, None);
    }

    /// Ignored when `index` is past the registered item count.
    pub fn register_item_bounds(&mut self, index: usize, bounds: Rect) {
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = Some(ItemSlot {
                    bounds,
                    attached: true,
                })
            }
            None => log::trace!("bounds for unknown item {} dropped", index),
        }
    }

    pub fn detach_item(&mut self, index: usize) {
        if let Some(Some(slot)) = self.items.get_mut(index) {
            slot.attached = false;
        }
    }

    pub fn register_anchor_bounds(&mut self, bounds: Rect) {
        self.anchor = Some(bounds);
    }

    pub fn detach_anchor(&mut self) {
        self.anchor = None;
    }

    pub fn register_menu_bounds(&mut self, bounds: Rect, padding: Insets) {
        self.menu = Some(MenuGeometry { bounds, padding });
        self.menu_epoch = self.menu_epoch.wrapping_add(1);
    }

    pub fn detach_menu(&mut self) {
        self.menu = None;
        self.menu_epoch = self.menu_epoch.wrapping_add(1);
    }

    /// Changes whenever the menu box is registered or detached, so a reader
    /// can tell a fresh layout from one left over by an earlier session.
    pub fn menu_epoch(&self) -> u64 {
        self.menu_epoch
    }

    pub fn item(&self, index: usize) -> Option<ItemSlot> {
        self.items.get(index).copied().flatten()
    }

    /// Bounds of an attached item, `None` for anything stale or unknown.
    pub fn item_bounds(&self, index: usize) -> Option<Rect> {
        self.item(index).and_then(|slot| slot.usable_bounds())
    }

    pub fn anchor(&self) -> Option<Rect> {
        self.anchor.filter(Rect::is_valid)
    }

    pub fn menu(&self) -> Option<MenuGeometry> {
        self.menu.filter(|m| m.bounds.is_valid())
    }
}

/// Cloneable handle to a repository that may be written from another thread.
///
/// Readers always take a full copy so a gesture never sees a half-applied
/// layout pass.
#[derive(Debug, Clone, Default)]
pub struct SharedGeometry {
    inner: Arc<RwLock<GeometryRepository>>,
}

impl SharedGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> GeometryRepository {
        self.inner.read().clone()
    }

    /// Applies several updates as one layout pass.
    pub fn update<R>(&self, f: impl FnOnce(&mut GeometryRepository) -> R) -> R {
        f(&mut self.inner.write())
    }

    pub fn register_item_count(&self, count: usize) {
        self.inner.write().register_item_count(count);
    }

    pub fn register_item_bounds(&self, index: usize, bounds: Rect) {
        self.inner.write().register_item_bounds(index, bounds);
    }

    pub fn detach_item(&self, index: usize) {
        self.inner.write().detach_item(index);
    }

    pub fn register_anchor_bounds(&self, bounds: Rect) {
        self.inner.write().register_anchor_bounds(bounds);
    }

    pub fn register_menu_bounds(&self, bounds: Rect, padding: Insets) {
        self.inner.write().register_menu_bounds(bounds, padding);
    }

    pub fn menu_epoch(&self) -> u64 {
        self.inner.read().menu_epoch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_and_detached_items_have_no_bounds() {
        let mut repo = GeometryRepository::new();
        repo.register_item_count(3);
        repo.register_item_bounds(0, Rect::new(0.0, 0.0, 100.0, 48.0));
        repo.register_item_bounds(2, Rect::new(0.0, 96.0, 100.0, 48.0));

        assert!(repo.item_bounds(0).is_some());
        assert!(repo.item_bounds(1).is_none());
        assert!(repo.item_bounds(7).is_none());

        repo.detach_item(2);
        assert!(repo.item_bounds(2).is_none());
        assert!(!repo.item(2).unwrap().attached);
    }

    #[test]
    fn test_bounds_past_count_are_dropped() {
        let mut repo = GeometryRepository::new();
        repo.register_item_count(1);
        repo.register_item_bounds(4, Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(repo.item_count(), 1);
        assert!(repo.item(4).is_none());
    }

    #[test]
    fn test_shrinking_count_forgets_slots() {
        let mut repo = GeometryRepository::new();
        repo.register_item_count(2);
        repo.register_item_bounds(1, Rect::new(0.0, 0.0, 1.0, 1.0));
        repo.register_item_count(1);
        repo.register_item_count(2);
        assert!(repo.item(1).is_none());
    }

    #[test]
    fn test_invalid_menu_is_unknown() {
        let mut repo = GeometryRepository::new();
        repo.register_menu_bounds(Rect::new(f32::NAN, 0.0, 10.0, 10.0), Insets::default());
        assert!(repo.menu().is_none());
    }

    #[test]
    fn test_menu_epoch_tracks_layout_passes() {
        let mut repo = GeometryRepository::new();
        let start = repo.menu_epoch();
        repo.register_anchor_bounds(Rect::new(0.0, 0.0, 10.0, 10.0));
        repo.register_item_count(3);
        assert_eq!(repo.menu_epoch(), start);

        repo.register_menu_bounds(Rect::new(0.0, 20.0, 10.0, 10.0), Insets::default());
        let placed = repo.menu_epoch();
        assert_ne!(placed, start);
        repo.detach_menu();
        assert_ne!(repo.menu_epoch(), placed);
    }

    #[test]
    fn test_content_bounds_are_menu_local() {
        let menu = MenuGeometry {
            bounds: Rect::new(300.0, 500.0, 200.0, 272.0),
            padding: Insets::symmetric(24.0, 16.0),
        };
        assert_eq!(menu.content_bounds(), Rect::new(24.0, 16.0, 152.0, 240.0));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let shared = SharedGeometry::new();
        shared.register_anchor_bounds(Rect::new(0.0, 0.0, 10.0, 10.0));
        let before = shared.snapshot();

        let writer = shared.clone();
        std::thread::spawn(move || {
            writer.update(|repo| {
                repo.register_anchor_bounds(Rect::new(50.0, 50.0, 10.0, 10.0));
                repo.register_item_count(4);
            });
        })
        .join()
        .unwrap();

        assert_eq!(before.anchor(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(shared.snapshot().item_count(), 4);
    }
}
