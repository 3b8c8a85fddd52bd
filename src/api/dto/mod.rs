//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod price_dto;
pub mod webhook_dto;

pub use common_dto::*;
pub use price_dto::*;
pub use webhook_dto::*;
