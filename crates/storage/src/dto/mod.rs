pub mod audit;
pub mod backup;
pub mod chip;
pub mod class;
pub mod control;
pub mod course;
pub mod entry;
pub mod event;
pub mod import;
pub mod punch;
pub mod race_state;
pub mod results;
pub mod stage;
