pub mod entity_service;

pub use entity_service::{parse_list_params, EntityService};
