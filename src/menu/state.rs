use super::effects::{MenuVisuals, StretchTransform, enter_pivot, should_hide_anchor};
use super::exclusion::{InteractiveRegion, Placement};
use super::frame::{HoverBarFrame, MenuFrame};
use super::hit_test::{HitTester, HoveredItem};
use super::hover_bar::{BarTarget, HoverBar, stretch_down_factor, stretch_up_factor};
use super::observer::{Observable, Publisher, SubscriptionId};
use super::registry::{GeometryRepository, MenuGeometry, SharedGeometry};
use crate::config::{AnchorTapBehavior, MenuConfig, StretchRelease};
use crate::events::{HapticKind, MenuEvent, PointerInput};
use derive_more::{Display, From, Into};
use dragmenu_geom::{Insets, Point, Rect};
use std::time::Duration;
use strum::Display as StrumDisplay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum GesturePhase {
    Closed,
    /// Pointer down on the anchor, long-press timer running.
    AwaitingLongPress,
    /// Menu visible, pointer up.
    Open,
    /// Pointer down inside the open menu, long-press timer running.
    Pressing,
    /// Pointer down and tracked across the menu.
    Dragging,
}

/// Identifies one arming of the long-press timer. A timeout carrying any
/// other token lost its race and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragOrigin {
    Anchor,
    Menu,
}

/// State for one open-to-close cycle.
#[derive(Debug, Clone, Default)]
pub struct GestureSession {
    pub is_menu_showing: bool,
    /// The pointer has hovered an item at least once since opening.
    pub is_pointer_hovering: bool,
    pub is_stretching_up: bool,
    pub is_stretching_down: bool,
    pub hovered: HoveredItem,
    /// Latched on the first sample that sees a registered item count.
    pub item_count: Option<usize>,
    /// Latched on the first sample that sees both anchor and a menu box laid
    /// out for this session.
    pub placement: Option<Placement>,
    /// Last item that fired a hover haptic. Padding and gaps leave it alone.
    pub last_hovered_item: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    last: Point,
    origin: DragOrigin,
}

/// The gesture core: feed it pointer samples, timer expiries and frame ticks;
/// read its observables or subscribe to its events.
#[derive(Debug)]
pub struct DraggableMenu {
    config: MenuConfig,
    geometry: SharedGeometry,
    phase: GesturePhase,
    session: GestureSession,
    hover_bar: HoverBar,
    visuals: MenuVisuals,
    press: Option<Press>,
    drag_origin: DragOrigin,
    timer: Option<TimerToken>,
    next_token: u64,
    /// Menu layout epoch seen when the previous session closed.
    stale_menu_epoch: Option<u64>,
    is_open: Observable<bool>,
    hovered_index: Observable<Option<usize>>,
    selected: Publisher<usize>,
    events: Publisher<MenuEvent>,
}

impl DraggableMenu {
    pub fn new(config: MenuConfig) -> Self {
        Self::with_geometry(config, SharedGeometry::new())
    }

    pub fn with_geometry(config: MenuConfig, geometry: SharedGeometry) -> Self {
        let visuals = MenuVisuals::new(config.hovered_item_scale, config.pressed_item_scale);
        Self {
            config,
            geometry,
            phase: GesturePhase::Closed,
            session: GestureSession::default(),
            hover_bar: HoverBar::new(),
            visuals,
            press: None,
            drag_origin: DragOrigin::Menu,
            timer: None,
            next_token: 0,
            stale_menu_epoch: None,
            is_open: Observable::new(false),
            hovered_index: Observable::new(None),
            selected: Publisher::new(),
            events: Publisher::new(),
        }
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    /// Handle for layout collaborators that live elsewhere.
    pub fn geometry(&self) -> SharedGeometry {
        self.geometry.clone()
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    pub fn hover_bar(&self) -> &HoverBar {
        &self.hover_bar
    }

    pub fn is_open(&self) -> bool {
        self.is_open.get()
    }

    pub fn hovered_index(&self) -> Option<usize> {
        self.hovered_index.get()
    }

    /// The long-press timer the caller should be running, if any.
    pub fn pending_long_press(&self) -> Option<TimerToken> {
        self.timer
    }

    pub fn subscribe_open(&mut self, f: impl FnMut(&bool) + Send + 'static) -> SubscriptionId {
        self.is_open.subscribe(f)
    }

    pub fn subscribe_hovered(
        &mut self,
        f: impl FnMut(&Option<usize>) + Send + 'static,
    ) -> SubscriptionId {
        self.hovered_index.subscribe(f)
    }

    /// Called once for every completed selection, never on cancel.
    pub fn on_item_selected(&mut self, mut f: impl FnMut(usize) + Send + 'static) -> SubscriptionId {
        self.selected.subscribe(move |index| f(*index))
    }

    pub fn subscribe(&mut self, f: impl FnMut(&MenuEvent) + Send + 'static) -> SubscriptionId {
        self.events.subscribe(f)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
            || self.selected.unsubscribe(id)
            || self.is_open.unsubscribe(id)
            || self.hovered_index.unsubscribe(id)
    }

    pub fn register_item_count(&self, count: usize) {
        self.geometry.register_item_count(count);
    }

    pub fn register_item_bounds(&self, index: usize, bounds: Rect) {
        self.geometry.register_item_bounds(index, bounds);
    }

    pub fn detach_item(&self, index: usize) {
        self.geometry.detach_item(index);
    }

    pub fn register_anchor_bounds(&self, bounds: Rect) {
        self.geometry.register_anchor_bounds(bounds);
    }

    pub fn register_menu_bounds(&self, bounds: Rect, padding: Insets) {
        self.geometry.register_menu_bounds(bounds, padding);
    }

    /// Shows the menu with the pointer up. No-op if already showing.
    pub fn open(&mut self) {
        if self.session.is_menu_showing {
            return;
        }
        self.session = GestureSession {
            is_menu_showing: true,
            ..GestureSession::default()
        };
        self.phase = GesturePhase::Open;
        let geometry = self.geometry.snapshot();
        self.latch_layout(&geometry);
        self.visuals.enter();
        log::debug!("menu opened");

        self.is_open.set(true);
        self.events.publish(&MenuEvent::Opened);
        self.events.publish(&MenuEvent::Haptic(HapticKind::LongPress));
    }

    /// Closes, selecting the current hover if it counts as a selection.
    pub fn close(&mut self) {
        let selected = self.releasable_hover();
        self.close_with(selected);
    }

    /// Closes without selecting anything.
    pub fn dismiss(&mut self) {
        self.close_with(None);
    }

    /// Ends the session. Safe to call repeatedly: once closed, further calls
    /// publish nothing.
    pub fn close_with(&mut self, selected: Option<usize>) {
        self.timer = None;
        self.press = None;
        self.visuals.release_press();

        if !self.session.is_menu_showing {
            self.phase = GesturePhase::Closed;
            return;
        }

        let item_count = self.session.item_count.unwrap_or(0);
        let selected = selected.filter(|&index| index < item_count);

        self.stale_menu_epoch = Some(self.geometry.menu_epoch());
        self.session = GestureSession::default();
        self.hover_bar.reset();
        self.visuals.end_session();
        self.phase = GesturePhase::Closed;
        log::debug!("menu closed, selected {:?}", selected);

        self.is_open.set(false);
        if self.hovered_index.set(None) {
            self.events.publish(&MenuEvent::HoveredChanged(None));
        }
        self.events.publish(&MenuEvent::Closed { selected });
        if let Some(index) = selected {
            self.events.publish(&MenuEvent::ItemSelected(index));
            self.selected.publish(&index);
        }
    }

    pub fn handle(&mut self, input: PointerInput) {
        match input {
            PointerInput::Down(p) => self.on_pointer_down(p),
            PointerInput::Move(p) => self.on_pointer_move(p),
            PointerInput::Up(p) => self.on_pointer_up(p),
            PointerInput::Cancel => self.on_pointer_cancel(),
            PointerInput::Dismiss => self.dismiss(),
        }
    }

    pub fn on_pointer_down(&mut self, p: Point) {
        if !p.is_valid() {
            log::trace!("dropping invalid pointer down {}", p);
            return;
        }
        match self.phase {
            GesturePhase::Closed => {
                let geometry = self.geometry.snapshot();
                if geometry.anchor().is_some_and(|anchor| anchor.contains(p)) {
                    self.phase = GesturePhase::AwaitingLongPress;
                    self.press = Some(Press {
                        last: p,
                        origin: DragOrigin::Anchor,
                    });
                    self.arm_timer();
                }
            }
            GesturePhase::Open => {
                let geometry = self.geometry.snapshot();
                match geometry.menu() {
                    Some(menu) if menu.bounds.contains(p) => {
                        self.latch_layout(&geometry);
                        let item = self.tester(&geometry).in_menu(p).index;
                        self.visuals.press(item);
                        self.phase = GesturePhase::Pressing;
                        self.press = Some(Press {
                            last: p,
                            origin: DragOrigin::Menu,
                        });
                        self.arm_timer();
                    }
                    _ => {
                        log::debug!("pointer down outside the menu, dismissing");
                        self.dismiss();
                    }
                }
            }
            GesturePhase::AwaitingLongPress | GesturePhase::Pressing | GesturePhase::Dragging => {
                log::debug!("ignoring pointer down during {}", self.phase);
            }
        }
    }

    pub fn on_pointer_move(&mut self, p: Point) {
        if !p.is_valid() {
            log::trace!("dropping invalid pointer move {}", p);
            return;
        }
        match self.phase {
            GesturePhase::AwaitingLongPress => {
                let anchor = self.geometry.snapshot().anchor();
                if anchor.is_some_and(|anchor| !anchor.contains(p)) {
                    log::debug!("pointer slid off the anchor at {}, long press aborted", p);
                    self.timer = None;
                    self.press = None;
                    self.phase = GesturePhase::Closed;
                } else if let Some(press) = &mut self.press {
                    press.last = p;
                }
            }
            GesturePhase::Pressing => {
                if let Some(press) = &mut self.press {
                    press.last = p;
                }
            }
            GesturePhase::Dragging => self.track(p),
            GesturePhase::Closed | GesturePhase::Open => {}
        }
    }

    /// An unusable release position still ends the gesture, at the last
    /// known position.
    pub fn on_pointer_up(&mut self, p: Point) {
        let p = if p.is_valid() {
            Some(p)
        } else {
            log::trace!("pointer up at invalid position {}", p);
            self.press.map(|press| press.last)
        };

        match self.phase {
            GesturePhase::AwaitingLongPress => {
                self.timer = None;
                self.press = None;
                self.phase = GesturePhase::Closed;
                self.events.publish(&MenuEvent::AnchorTapped);
                if self.config.anchor_tap == AnchorTapBehavior::Open {
                    self.open();
                }
            }
            GesturePhase::Pressing => {
                self.timer = None;
                self.visuals.release_press();
                let geometry = self.geometry.snapshot();
                let hit = p
                    .map(|p| self.tester(&geometry).in_menu(p))
                    .unwrap_or(HoveredItem::NONE);
                let selected = self.selectable(&hit, &geometry);
                self.close_with(selected);
            }
            GesturePhase::Dragging => {
                if let Some(p) = p {
                    self.track(p);
                }
                if self.phase != GesturePhase::Dragging {
                    // the final sample left the region and cancelled
                    return;
                }
                self.press = None;
                if self.drag_origin == DragOrigin::Anchor && !self.session.is_pointer_hovering {
                    // Held the anchor but never reached an item: keep the menu
                    // up for a follow-up tap.
                    self.phase = GesturePhase::Open;
                    return;
                }
                self.close();
            }
            GesturePhase::Closed | GesturePhase::Open => {}
        }
    }

    pub fn on_pointer_cancel(&mut self) {
        match self.phase {
            GesturePhase::AwaitingLongPress => self.close_with(None),
            GesturePhase::Pressing => {
                self.timer = None;
                self.press = None;
                self.visuals.release_press();
                self.phase = GesturePhase::Open;
            }
            GesturePhase::Dragging => self.dismiss(),
            GesturePhase::Closed | GesturePhase::Open => {}
        }
    }

    /// The long-press timer armed as `token` fired.
    pub fn on_long_press_timeout(&mut self, token: TimerToken) {
        if self.timer != Some(token) {
            log::trace!("stale long-press timer {}", token);
            return;
        }
        self.timer = None;
        let Some(press) = self.press else {
            return;
        };

        match self.phase {
            GesturePhase::AwaitingLongPress => {
                self.open();
            }
            GesturePhase::Pressing => {
                self.visuals.release_press();
            }
            _ => return,
        }
        self.phase = GesturePhase::Dragging;
        self.drag_origin = press.origin;
        log::debug!("long press, dragging from {:?}", press.origin);
        self.track(press.last);
    }

    /// Advances every animation by `dt`. Returns whether any is still running.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let bar = self.hover_bar.step(dt);
        let visuals = self.visuals.step(dt);
        bar || visuals
    }

    pub fn is_animating(&self) -> bool {
        self.hover_bar.is_animating() || self.visuals.is_animating()
    }

    /// Squash/stretch amount in `[0, 1]`, 0 unless stretching.
    pub fn stretch_factor(&self) -> f32 {
        let Some(menu) = self.geometry.snapshot().menu() else {
            return 0.0;
        };
        self.stretch_factor_for(menu.bounds.height)
    }

    /// Whether a drag sample at `p` would cancel the gesture.
    pub fn is_outside_interactive_region(&self, p: Point) -> bool {
        let geometry = self.geometry.snapshot();
        self.region(&geometry).is_some_and(|region| region.is_outside(p))
    }

    /// Everything a renderer needs for the current frame.
    pub fn frame(&self) -> MenuFrame {
        let geometry = self.geometry.snapshot();
        let menu = geometry.menu();
        let factor = menu.map_or(0.0, |m| self.stretch_factor_for(m.bounds.height));
        let scale = self.visuals.menu_scale();
        MenuFrame {
            open: self.session.is_menu_showing,
            menu: menu.map(|m| m.bounds),
            content: menu.map(|m| m.content_bounds().translate(m.origin())),
            menu_scale: scale,
            menu_alpha: scale.clamp(0.0, 1.0),
            pivot: match (geometry.anchor(), menu) {
                (Some(anchor), Some(menu)) => enter_pivot(anchor, menu.bounds),
                _ => Point::new(0.5, 0.5),
            },
            stretch: StretchTransform::new(
                self.session.is_stretching_up,
                self.session.is_stretching_down,
                factor,
                self.config.stretch_scale,
            ),
            anchor_scale: self.visuals.anchor_scale(),
            hovered_index: self.hovered_index.get(),
            hover_bar: HoverBarFrame {
                offset: self.hover_bar.offset(),
                height: self.hover_bar.height(),
                visibility: self.hover_bar.visibility(),
            },
            items: self.visuals.item_frames(),
        }
    }

    fn arm_timer(&mut self) {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.timer = Some(token);
    }

    fn tester<'a>(&self, geometry: &'a GeometryRepository) -> HitTester<'a> {
        HitTester::new(
            geometry,
            self.session.item_count.unwrap_or(0),
            self.session.is_pointer_hovering,
        )
    }

    fn latch_layout(&mut self, geometry: &GeometryRepository) {
        if self.session.item_count.is_none() && geometry.item_count() > 0 {
            self.session.item_count = Some(geometry.item_count());
            self.visuals.ensure_items(geometry.item_count());
        }
        // A menu box older than the last close belongs to the previous layout.
        if self.session.placement.is_none()
            && self.stale_menu_epoch != Some(geometry.menu_epoch())
            && let (Some(anchor), Some(menu)) = (geometry.anchor(), geometry.menu())
        {
            let placement = Placement::classify(anchor, menu.bounds);
            log::debug!("menu placed {} the anchor", placement);
            self.session.placement = Some(placement);
        }
    }

    /// The latched placement, or the current layout's until this session's
    /// menu box shows up.
    fn placement(&self, geometry: &GeometryRepository) -> Option<Placement> {
        self.session.placement.or_else(|| {
            let (anchor, menu) = (geometry.anchor()?, geometry.menu()?);
            Some(Placement::classify(anchor, menu.bounds))
        })
    }

    fn region(&self, geometry: &GeometryRepository) -> Option<InteractiveRegion> {
        let menu = geometry.menu()?;
        Some(InteractiveRegion {
            anchor: geometry.anchor(),
            menu: menu.bounds,
            placement: self
                .placement(geometry)
                .unwrap_or(Placement::Overlapping),
            pointer_hovering: self.session.is_pointer_hovering,
        })
    }

    fn stretch_factor_for(&self, menu_height: f32) -> f32 {
        let hovered = &self.session.hovered;
        if self.session.is_stretching_up {
            stretch_up_factor(hovered, menu_height)
        } else if self.session.is_stretching_down {
            stretch_down_factor(hovered, menu_height)
        } else {
            0.0
        }
    }

    /// The hovered item, unless the policy says a stretch-zone release does
    /// not count.
    fn releasable_hover(&self) -> Option<usize> {
        let geometry = self.geometry.snapshot();
        self.selectable(&self.session.hovered, &geometry)
    }

    fn selectable(&self, hit: &HoveredItem, geometry: &GeometryRepository) -> Option<usize> {
        let index = hit.index?;
        if self.config.stretch_release == StretchRelease::Select {
            return Some(index);
        }
        let inside = geometry.item_bounds(index).is_some_and(|bounds| {
            hit.pointer_offset_from_top >= 0.0 && hit.pointer_offset_from_top <= bounds.height
        });
        inside.then_some(index)
    }

    /// One drag sample: hit test, move the hover bar, then cancel if the
    /// pointer left the interactive region.
    fn track(&mut self, p: Point) {
        if let Some(press) = &mut self.press {
            press.last = p;
        }
        let geometry = self.geometry.snapshot();
        self.latch_layout(&geometry);
        let Some(menu) = geometry.menu() else {
            log::trace!("no menu geometry yet, sample ignored");
            return;
        };

        self.update_hover(p, &geometry, menu);

        if self
            .region(&geometry)
            .is_some_and(|region| region.is_outside(p))
        {
            log::debug!("pointer left the menu region at {}", p);
            self.dismiss();
        }
    }

    fn update_hover(&mut self, p: Point, geometry: &GeometryRepository, menu: MenuGeometry) {
        let hovered = self.tester(geometry).at_screen(p);
        self.session.hovered = hovered;
        if !hovered.is_none() {
            self.session.is_pointer_hovering = true;
        }

        let menu_top = menu.bounds.top();
        self.hover_bar.update(BarTarget {
            hovered,
            pointer_y: p.y - menu_top,
            item_top: hovered
                .index
                .and_then(|i| geometry.item_bounds(i))
                .map(|b| b.top() - menu_top),
            content: Some(menu.content_bounds()),
        });

        if self.session.is_pointer_hovering {
            let last = self.session.item_count.unwrap_or(0).checked_sub(1);
            self.session.is_stretching_up =
                hovered.index == Some(0) && hovered.pointer_offset_from_top < 0.0;
            self.session.is_stretching_down = hovered.index.is_some()
                && hovered.index == last
                && hovered.pointer_offset_from_top - hovered.height > 0.0;
            if self.session.is_stretching_up {
                self.hover_bar.pin_snapped_offset(0.0);
            }
            if self.session.is_stretching_down {
                self.hover_bar.pin_snapped_offset(hovered.height);
            }
        }

        self.visuals.on_hover(&hovered);
        let stretching = self.session.is_stretching_up || self.session.is_stretching_down;
        if stretching || hovered.is_none() {
            let hide = should_hide_anchor(
                self.placement(geometry),
                self.session.is_stretching_up,
                self.session.is_stretching_down,
                self.stretch_factor_for(menu.bounds.height),
                self.config.anchor_hide_threshold,
            );
            self.visuals.set_anchor_hidden(hide);
        }

        if self.hovered_index.set(hovered.index) {
            self.events.publish(&MenuEvent::HoveredChanged(hovered.index));
        }
        if hovered.index.is_some() && hovered.index != self.session.last_hovered_item {
            self.session.last_hovered_item = hovered.index;
            self.events
                .publish(&MenuEvent::Haptic(HapticKind::TextHandleMove));
        }
    }
}

impl Default for DraggableMenu {
    fn default() -> Self {
        Self::new(MenuConfig::default())
    }
}
