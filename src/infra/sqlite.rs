pub mod audit_repo;
pub mod entity_repo;
pub mod store;
