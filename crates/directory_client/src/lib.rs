//! Query orchestration for the faculty directory: picks which read to issue,
//! runs it against a [`RecordStore`] and reconciles the answer into view state.

pub mod config;
pub mod controller;
pub mod store;

pub use config::{load_settings, StoreEndpoint, StoreSettings};
pub use controller::{Collection, DirectoryController, DirectoryEvent, Ticket, ViewState};
pub use store::{postgrest::PostgrestStore, MissingRecordStore, RecordStore};
