pub mod session;

pub use session::{my_permissions, refresh, whoami};
