use crate::events::{DriverEvent, MenuCommand, MenuEvent};
use crate::menu::{DraggableMenu, TimerToken};
use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Runs a [`DraggableMenu`] on a tokio task: commands in, events and frames
/// out. The long-press timer and the frame clock are both tokio timers.
pub struct MenuDriver {
    menu: DraggableMenu,
    commands: Receiver<MenuCommand>,
    events: Sender<DriverEvent>,
    outbox: Arc<Mutex<Vec<MenuEvent>>>,
    deadline: Option<(TimerToken, Instant)>,
}

impl MenuDriver {
    pub fn new(
        mut menu: DraggableMenu,
        commands: Receiver<MenuCommand>,
        events: Sender<DriverEvent>,
    ) -> Self {
        let outbox = Arc::new(Mutex::new(Vec::new()));
        {
            let outbox = outbox.clone();
            menu.subscribe(move |e| outbox.lock().push(*e));
        }
        Self {
            menu,
            commands,
            events,
            outbox,
            deadline: None,
        }
    }

    /// Returns when the command channel closes or nobody listens anymore.
    pub async fn run(mut self) {
        let frame_interval = self
            .menu
            .config()
            .frame_interval
            .max(Duration::from_millis(1));
        let mut frames = tokio::time::interval(frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_frame: Option<Instant> = None;

        loop {
            self.sync_deadline();
            let animating = self.menu.is_animating();
            if !animating {
                last_frame = None;
            }
            let deadline = self.deadline;

            tokio::select! {
                command = self.commands.recv() => {
                    let Ok(command) = command else {
                        log::debug!("command channel closed, stopping driver");
                        break;
                    };
                    self.apply(command);
                }
                _ = wait_for(deadline) => {
                    if let Some((token, _)) = deadline {
                        self.deadline = None;
                        self.menu.on_long_press_timeout(token);
                    }
                }
                now = frames.tick(), if animating => {
                    let dt = last_frame.map_or(frame_interval, |last| now - last);
                    last_frame = Some(now);
                    self.menu.tick(dt);
                    if self.events.send(DriverEvent::Frame(self.menu.frame())).await.is_err() {
                        break;
                    }
                }
            }

            if !self.flush().await {
                log::debug!("event receiver dropped, stopping driver");
                break;
            }
        }
    }

    fn apply(&mut self, command: MenuCommand) {
        match command {
            MenuCommand::Pointer(input) => self.menu.handle(input),
            MenuCommand::Open => self.menu.open(),
            MenuCommand::Close => self.menu.close(),
        }
    }

    /// Arms a deadline for every new timer token the menu asks for.
    fn sync_deadline(&mut self) {
        match self.menu.pending_long_press() {
            Some(token) if self.deadline.is_some_and(|(armed, _)| armed == token) => {}
            Some(token) => {
                let at = Instant::now() + self.menu.config().long_press_timeout;
                self.deadline = Some((token, at));
            }
            None => self.deadline = None,
        }
    }

    async fn flush(&mut self) -> bool {
        let pending = std::mem::take(&mut *self.outbox.lock());
        for event in pending {
            if self.events.send(DriverEvent::Menu(event)).await.is_err() {
                return false;
            }
        }
        true
    }
}

async fn wait_for(deadline: Option<(TimerToken, Instant)>) {
    match deadline {
        Some((_, at)) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Spawns a driver on the current tokio runtime.
pub fn spawn(menu: DraggableMenu) -> (Sender<MenuCommand>, Receiver<DriverEvent>, JoinHandle<()>) {
    let (command_tx, command_rx) = async_channel::bounded(32);
    let (event_tx, event_rx) = async_channel::bounded(64);
    let handle = tokio::spawn(MenuDriver::new(menu, command_rx, event_tx).run());
    (command_tx, event_rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{HapticKind, PointerInput};
    use dragmenu_geom::{Insets, Point, Rect};

    fn five_items() -> DraggableMenu {
        let menu = DraggableMenu::default();
        menu.register_anchor_bounds(Rect::new(180.0, 800.0, 40.0, 40.0));
        menu.register_menu_bounds(
            Rect::new(100.0, 400.0, 200.0, 272.0),
            Insets::symmetric(24.0, 16.0),
        );
        menu.register_item_count(5);
        for i in 0..5 {
            menu.register_item_bounds(i, Rect::new(124.0, 416.0 + i as f32 * 48.0, 152.0, 48.0));
        }
        menu
    }

    const ANCHOR: Point = Point { x: 200.0, y: 820.0 };

    async fn next_menu_event(events: &Receiver<DriverEvent>) -> MenuEvent {
        loop {
            match events.recv().await.unwrap() {
                DriverEvent::Menu(e) => return e,
                DriverEvent::Frame(_) => continue,
            }
        }
    }

    async fn send(commands: &Sender<MenuCommand>, input: PointerInput) {
        commands.send(MenuCommand::Pointer(input)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_press_opens_after_timeout() {
        let (commands, events, _handle) = spawn(five_items());
        let start = Instant::now();

        send(&commands, PointerInput::Down(ANCHOR)).await;
        assert_eq!(next_menu_event(&events).await, MenuEvent::Opened);
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert_eq!(
            next_menu_event(&events).await,
            MenuEvent::Haptic(HapticKind::LongPress)
        );

        // held 600 ms: still open after release, nothing selected
        tokio::time::sleep_until(start + Duration::from_millis(600)).await;
        send(&commands, PointerInput::Up(ANCHOR)).await;
        commands.send(MenuCommand::Close).await.unwrap();
        assert_eq!(
            next_menu_event(&events).await,
            MenuEvent::Closed { selected: None }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_tap_never_opens() {
        let (commands, events, handle) = spawn(five_items());

        send(&commands, PointerInput::Down(ANCHOR)).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        send(&commands, PointerInput::Up(ANCHOR)).await;
        assert_eq!(next_menu_event(&events).await, MenuEvent::AnchorTapped);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(events.try_recv().is_err());

        drop(commands);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_and_release_selects() {
        let (commands, events, _handle) = spawn(five_items());

        send(&commands, PointerInput::Down(ANCHOR)).await;
        assert_eq!(next_menu_event(&events).await, MenuEvent::Opened);

        send(&commands, PointerInput::Move(Point::new(200.0, 700.0))).await;
        send(&commands, PointerInput::Move(Point::new(200.0, 536.0))).await;
        send(&commands, PointerInput::Up(Point::new(200.0, 536.0))).await;

        let mut seen = Vec::new();
        loop {
            let event = next_menu_event(&events).await;
            seen.push(event);
            if matches!(event, MenuEvent::ItemSelected(_)) {
                break;
            }
        }
        assert!(seen.contains(&MenuEvent::HoveredChanged(Some(2))));
        assert_eq!(seen.last(), Some(&MenuEvent::ItemSelected(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_flow_while_animating() {
        let (commands, events, _handle) = spawn(five_items());
        commands.send(MenuCommand::Open).await.unwrap();

        let mut last_scale = None;
        loop {
            if let DriverEvent::Frame(frame) = events.recv().await.unwrap() {
                last_scale = Some(frame.menu_scale);
                if frame.menu_scale == 1.0 {
                    break;
                }
            }
        }
        assert_eq!(last_scale, Some(1.0));
    }
}
