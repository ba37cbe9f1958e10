pub mod log_filter;
pub mod log_view;
pub mod models;
pub mod timestamp;

pub use log_filter::{entry_matches, filter_logs};
pub use log_view::{LogView, Selection};
pub use models::{Container, ContainerState, FilterSpec, LogEntry, StreamKind};
pub use timestamp::{parse_timestamp, truncate_to_millis, validate_timestamp, TimestampError};
