//! Battle notifications routed to the UI and story layers.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{Event, OutcomeEvent, StoryEvent, Topic};
