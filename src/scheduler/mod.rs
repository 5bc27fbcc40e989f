pub mod record;
pub mod runner;
pub mod schedule;
pub mod storage;
pub mod timezone;

pub use record::{NotificationRecord, NotificationStatus};
pub use runner::{Dispatcher, DispatcherHandle, TickReport, DEFAULT_DISPATCH_INTERVAL};
pub use schedule::{NotificationScheduler, ScheduledNotification, DEFAULT_LEAD_TIME};
pub use storage::{NotificationStore, SqliteStore, StoreError};
pub use timezone::UtcOffset;
