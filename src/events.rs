use crate::menu::MenuFrame;
use dragmenu_geom::Point;
use strum::Display;

/// One raw input for the gesture core, already in root coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down(Point),
    Move(Point),
    Up(Point),
    Cancel,
    /// Backdrop tap or any other request to close without selecting.
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum HapticKind {
    /// Menu opened by a long press.
    LongPress,
    /// The hovered item changed.
    TextHandleMove,
}

/// Everything the core publishes to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    Opened,
    Closed { selected: Option<usize> },
    HoveredChanged(Option<usize>),
    ItemSelected(usize),
    /// The anchor was tapped without holding long enough to open the menu.
    AnchorTapped,
    Haptic(HapticKind),
}

/// Commands accepted by the async driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuCommand {
    Pointer(PointerInput),
    Open,
    Close,
}

/// What the async driver sends back out.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    Menu(MenuEvent),
    Frame(MenuFrame),
}
