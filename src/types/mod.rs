//! EKM iSerial type definitions.
//!
//! This module contains the core types for the protocol:
//!
//! - `Field` - Closed set of field names and their casting rules
//! - `ResponseVariant` - Request/response shapes and their byte layouts
//! - `Value` - Typed field values
//! - Coded status tables (pulse inputs, current direction, outputs, demand)

mod codes;
mod field;
mod layout;
mod value;

pub use codes::*;
pub use field::*;
pub use layout::*;
pub use value::*;
