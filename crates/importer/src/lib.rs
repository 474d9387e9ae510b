pub mod bridge;
pub mod csv_import;
pub mod error;
pub mod sources;
pub mod traits;

pub use bridge::{Bridge, BridgeSnapshot, BridgeStatus};
pub use error::{ImporterError, Result};
pub use sources::roc::RocClient;
pub use traits::{ProviderPunch, PunchProvider, PunchSink};
