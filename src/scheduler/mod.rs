//! Automatic snapshot scheduling.
//!
//! Two independent triggers feed the same capture path:
//!
//! - **Interval**: every period while the document is non-empty.
//! - **Delta**: after a quiet period with no edits, when the document's
//!   length moved far enough from the baseline.
//!
//! The same worker also debounces writes of the draft and policy text to
//! the settings namespace. Manual snapshots bypass the scheduler entirely.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = Scheduler::start(history, settings, ScheduleConfig::default(), content, policy)?;
//! scheduler.content_changed("New paragraph...");
//! while let Ok(event) = scheduler.events().try_recv() {
//!     println!("{:?}", event);
//! }
//! ```

mod policy;
mod timers;
mod worker;

pub use policy::DeltaPolicy;
pub use timers::{TimerSet, Trigger};
pub use worker::{Scheduler, SchedulerEvent};
