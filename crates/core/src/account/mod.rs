//! Account records, the status state machine, and the datastore surface.

mod rest_store;
mod store;
mod types;

pub use rest_store::RestAccountStore;
pub use store::{AccountStore, AccountStoreError, StatusUpdate};
pub use types::{AccountRecord, AccountStatus, UnknownStatus};
