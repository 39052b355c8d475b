//! Products
//!
//! Cart items point at products through a [`ProductRef`]; the
//! [`ProductRegistry`] turns that reference back into something implementing
//! [`Product`] by asking the [`ProductKind`] registered for its tag.

pub mod capability;
pub mod errors;
pub mod records;
pub mod registry;
pub mod variants;

pub use capability::{ExtraAttrs, Product, ProductKind};
pub use errors::ProductError;
pub use records::{ProductRef, ProductTypeTag, ProductUuid};
pub use registry::ProductRegistry;
