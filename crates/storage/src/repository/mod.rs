pub mod audit;
pub mod chip;
pub mod class;
pub mod control;
pub mod course;
pub mod entry;
pub mod event;
pub mod punch;
pub mod race_state;
pub mod stage;
