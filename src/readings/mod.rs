pub mod store;

pub use store::{ReadingStore, DEFAULT_READINGS_LIMIT, MAX_READINGS_LIMIT};
