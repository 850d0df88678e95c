mod entry;
mod record;
mod store;

pub use entry::{CombinationEntry, StyleVariant};
pub use record::{HistoryRecord, HISTORY_SCHEMA_VERSION};
pub use store::{write_run_output, HistoryStore};
