//! Core types for the Tether contract-first HTTP client.
//!
//! This crate provides the foundation types used across all Tether
//! components:
//! - Error taxonomy with stable codes
//! - Path template and query-string utilities
//! - Validator contract and built-in schema engine
//! - Contract model and endpoint resolver
//! - Normalized request/response contexts

pub mod context;
pub mod contract;
pub mod error;
pub mod path;
pub mod schema;

pub use context::{Method, RequestContext, ResponseContext};
pub use contract::{Contract, ContractNode, Endpoint, EndpointDescription};
pub use error::{Error, Issue, Result, ValidationKind};
pub use schema::{describe_validator, validate_with, Schema, SchemaShape, Validator};
