pub mod audit;
pub mod backups;
pub mod bridge;
pub mod course_model;
pub mod entries;
pub mod events;
pub mod punches;
pub mod race;
pub mod results;
