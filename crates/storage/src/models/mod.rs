mod audit;
mod chip;
mod class;
mod control;
mod course;
mod entry;
mod event;
mod punch;
mod race_state;
mod stage;
mod time_precision;

pub use audit::AuditLogEntry;
pub use chip::Chip;
pub use class::Class;
pub use control::{Control, ControlType};
pub use course::{Course, CourseStage};
pub use entry::Entry;
pub use event::{Event, EventStatus};
pub use punch::{Punch, PunchSource};
pub use race_state::RaceState;
pub use stage::Stage;
pub use time_precision::TimePrecision;
