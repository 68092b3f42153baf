pub mod audit;
pub mod entity;
pub mod error;
pub mod field;
pub mod schema;
