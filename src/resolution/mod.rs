//! Resolution cache and resolver
//!
//! - `model`: error keys, resolutions and persisted entries
//! - `store`: the durable, file-backed cache
//! - `resolver`: cache-then-oracle lookup with address substitution

pub mod model;
pub mod resolver;
pub mod store;

pub use model::{ErrorKey, Resolution, ResolutionEntry, ADDRESS_PLACEHOLDER, UNAVAILABLE_TEXT};
pub use resolver::ResolutionResolver;
pub use store::ResolutionStore;
