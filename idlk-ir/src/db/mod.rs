//! Database access for idlk-ir

pub mod contacts;

pub use contacts::{ContactStore, ContactTx};
