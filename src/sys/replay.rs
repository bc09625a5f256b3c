//! Offline replay of recorded pointer traces.
//!
//! A trace is a TOML file holding the layout (anchor, menu, items) and a list
//! of timestamped pointer events. The replayer feeds them to a
//! [`DraggableMenu`] on a virtual clock, firing the long-press timer and
//! stepping animations exactly as a live driver would, minus the waiting.

use crate::config::MenuConfig;
use crate::events::{MenuCommand, MenuEvent, PointerInput};
use crate::menu::{DraggableMenu, MenuFrame, TimerToken};
use derive_more::Display;
use dragmenu_geom::{Insets, Point, Rect};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_with::DeserializeFromStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use strum::{Display as StrumDisplay, EnumString};
use thiserror::Error;

/// Upper bound on how long the replayer keeps ticking after the last event.
const SETTLE_LIMIT: Duration = Duration::from_secs(5);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, DeserializeFromStr, EnumString, StrumDisplay,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TraceEventKind {
    #[strum(to_string = "down", serialize = "press")]
    Down,
    #[strum(to_string = "move", serialize = "drag")]
    Move,
    #[strum(to_string = "up", serialize = "release")]
    Up,
    Cancel,
    Dismiss,
    Open,
    Close,
}

impl TraceEventKind {
    fn needs_position(&self) -> bool {
        matches!(self, Self::Down | Self::Move | Self::Up)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TraceEvent {
    pub at_ms: u64,
    pub kind: TraceEventKind,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TraceMenu {
    pub bounds: Rect,
    #[serde(default)]
    pub padding: Insets,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Trace {
    pub anchor: Option<Rect>,
    pub menu: Option<TraceMenu>,
    #[serde(default)]
    pub items: Vec<Rect>,
    #[serde(default)]
    pub events: Vec<TraceEvent>,
}

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Trace error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Event {index} ({kind}) needs both x and y")]
    MissingPosition { index: usize, kind: TraceEventKind },
}

impl Trace {
    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let s = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        s.try_deserialize::<Self>()?.validated()
    }

    pub fn from_toml(text: &str) -> Result<Self, TraceError> {
        let s = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?;
        s.try_deserialize::<Self>()?.validated()
    }

    fn validated(self) -> Result<Self, TraceError> {
        for (index, event) in self.events.iter().enumerate() {
            if event.kind.needs_position() && (event.x.is_none() || event.y.is_none()) {
                return Err(TraceError::MissingPosition {
                    index,
                    kind: event.kind,
                });
            }
        }
        Ok(self)
    }

    /// Registers the recorded layout on `menu`.
    pub fn apply_layout(&self, menu: &DraggableMenu) {
        menu.geometry().update(|repo| {
            if let Some(anchor) = self.anchor {
                repo.register_anchor_bounds(anchor);
            }
            if let Some(m) = &self.menu {
                repo.register_menu_bounds(m.bounds, m.padding);
            }
            repo.register_item_count(self.items.len());
            for (i, bounds) in self.items.iter().enumerate() {
                repo.register_item_bounds(i, *bounds);
            }
        });
    }
}

impl TraceEvent {
    fn command(&self) -> MenuCommand {
        let p = Point::new(self.x.unwrap_or(f32::NAN), self.y.unwrap_or(f32::NAN));
        match self.kind {
            TraceEventKind::Down => MenuCommand::Pointer(PointerInput::Down(p)),
            TraceEventKind::Move => MenuCommand::Pointer(PointerInput::Move(p)),
            TraceEventKind::Up => MenuCommand::Pointer(PointerInput::Up(p)),
            TraceEventKind::Cancel => MenuCommand::Pointer(PointerInput::Cancel),
            TraceEventKind::Dismiss => MenuCommand::Pointer(PointerInput::Dismiss),
            TraceEventKind::Open => MenuCommand::Open,
            TraceEventKind::Close => MenuCommand::Close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Display)]
#[display("[{:>6}ms] {:?}", at.as_millis(), event)]
pub struct TimedEvent {
    pub at: Duration,
    pub event: MenuEvent,
}

#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub events: Vec<TimedEvent>,
    pub frame: MenuFrame,
    pub is_open: bool,
}

impl ReplayReport {
    pub fn selected(&self) -> Option<usize> {
        self.events.iter().find_map(|e| match e.event {
            MenuEvent::ItemSelected(index) => Some(index),
            _ => None,
        })
    }

    pub fn contains(&self, event: MenuEvent) -> bool {
        self.events.iter().any(|e| e.event == event)
    }
}

/// Drives a menu through a trace on a virtual clock.
pub struct Replayer {
    menu: DraggableMenu,
    now: Duration,
    deadline: Option<(TimerToken, Duration)>,
    outbox: Arc<Mutex<Vec<MenuEvent>>>,
    log: Vec<TimedEvent>,
}

impl Replayer {
    pub fn new(config: MenuConfig) -> Self {
        let mut menu = DraggableMenu::new(config);
        let outbox = Arc::new(Mutex::new(Vec::new()));
        {
            let outbox = outbox.clone();
            menu.subscribe(move |e| outbox.lock().push(*e));
        }
        Self {
            menu,
            now: Duration::ZERO,
            deadline: None,
            outbox,
            log: Vec::new(),
        }
    }

    pub fn menu(&self) -> &DraggableMenu {
        &self.menu
    }

    pub fn run(mut self, trace: &Trace) -> ReplayReport {
        trace.apply_layout(&self.menu);

        let mut events: Vec<&TraceEvent> = trace.events.iter().collect();
        events.sort_by_key(|e| e.at_ms);

        for event in events {
            self.advance_to(Duration::from_millis(event.at_ms));
            log::debug!("t={}ms {}", event.at_ms, event.kind);
            match event.command() {
                MenuCommand::Pointer(input) => self.menu.handle(input),
                MenuCommand::Open => self.menu.open(),
                MenuCommand::Close => self.menu.close(),
            }
            self.sync_deadline();
            self.collect();
        }

        let limit = self.now + SETTLE_LIMIT;
        while (self.deadline.is_some() || self.menu.is_animating()) && self.now < limit {
            let next = self.now + self.frame_interval();
            self.advance_to(next.min(limit));
        }

        ReplayReport {
            frame: self.menu.frame(),
            is_open: self.menu.is_open(),
            events: self.log,
        }
    }

    fn frame_interval(&self) -> Duration {
        self.menu
            .config()
            .frame_interval
            .max(Duration::from_millis(1))
    }

    /// Moves the clock to `t`, firing the timer on the way. A timer due at
    /// exactly `t` fires before whatever happens at `t`.
    fn advance_to(&mut self, t: Duration) {
        while let Some((token, due)) = self.deadline {
            if due > t {
                break;
            }
            self.step_frames(due);
            self.deadline = None;
            self.menu.on_long_press_timeout(token);
            self.sync_deadline();
            self.collect();
        }
        self.step_frames(t);
        self.collect();
    }

    fn step_frames(&mut self, to: Duration) {
        let interval = self.frame_interval();
        while self.now < to {
            let dt = interval.min(to - self.now);
            self.menu.tick(dt);
            self.now += dt;
        }
    }

    fn sync_deadline(&mut self) {
        match self.menu.pending_long_press() {
            Some(token) if self.deadline.is_some_and(|(armed, _)| armed == token) => {}
            Some(token) => {
                self.deadline = Some((token, self.now + self.menu.config().long_press_timeout))
            }
            None => self.deadline = None,
        }
    }

    fn collect(&mut self) {
        let now = self.now;
        self.log.extend(
            self.outbox
                .lock()
                .drain(..)
                .map(|event| TimedEvent { at: now, event }),
        );
    }
}
