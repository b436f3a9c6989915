// Pick records: data model, local persistence, merge resolution, validation.

pub mod merge;
pub mod record;
pub mod store;
pub mod validate;

pub use merge::merge_records;
pub use record::{Pick, PickRecord, PickSet};
pub use store::PickStore;
