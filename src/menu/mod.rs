pub mod effects;
pub mod exclusion;
pub mod frame;
pub mod hover_bar;
pub mod observer;
pub mod registry;
pub mod state;

pub use exclusion::{InteractiveRegion, Placement};
pub use frame::{HoverBarFrame, MenuFrame};
pub use hit_test::{HitTester, HoveredItem};
pub use hover_bar::HoverBar;
pub use observer::SubscriptionId;
pub use registry::{GeometryRepository, MenuGeometry, SharedGeometry};
pub use state::{DraggableMenu, GesturePhase, GestureSession, TimerToken};
