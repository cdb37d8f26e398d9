//! Database schema, models and finance queries

pub mod finance;
pub mod init;
pub mod models;

pub use finance::*;
pub use init::*;
pub use models::*;
