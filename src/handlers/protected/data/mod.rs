pub mod collection;
pub mod dispatch;
pub mod record;

// Re-export handler functions for use in routing
pub use collection::{create, describe, list};
pub use dispatch::dispatch;
pub use record::{remove, show, update};
