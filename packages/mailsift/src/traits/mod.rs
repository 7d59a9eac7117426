//! Core trait abstractions (record sources and stores).

pub mod source;
pub mod store;

pub use source::RecordSource;
pub use store::{MailStore, StoreConnector};
