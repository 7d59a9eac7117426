//! Record source implementations.

pub mod mbox;

pub use mbox::MboxSource;
