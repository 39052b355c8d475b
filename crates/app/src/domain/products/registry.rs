//! Product registry

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::domain::products::{
    capability::{Product, ProductKind},
    errors::ProductError,
    records::{ProductRef, ProductTypeTag},
};

/// Resolves [`ProductRef`]s through the [`ProductKind`] registered for their tag.
#[derive(Debug, Clone, Default)]
pub struct ProductRegistry {
    kinds: FxHashMap<ProductTypeTag, Arc<dyn ProductKind>>,
}

impl ProductRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind, replacing any kind previously registered for its tag.
    #[must_use]
    pub fn with(mut self, kind: Arc<dyn ProductKind>) -> Self {
        self.register(kind);
        self
    }

    pub fn register(&mut self, kind: Arc<dyn ProductKind>) {
        let tag = kind.tag();

        debug!(product_type = %tag, "registered product kind");

        self.kinds.insert(tag, kind);
    }

    /// Registered tags, in no particular order.
    pub fn tags(&self) -> impl Iterator<Item = &ProductTypeTag> {
        self.kinds.keys()
    }

    fn kind(&self, tag: &ProductTypeTag) -> Result<&Arc<dyn ProductKind>, ProductError> {
        self.kinds
            .get(tag)
            .ok_or_else(|| ProductError::UnknownType(tag.clone()))
    }

    /// Look a product up; `None` means the record is gone (a tombstone).
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::UnknownType`] for an unregistered tag, or the
    /// kind's own storage error.
    pub async fn resolve(
        &self,
        product: &ProductRef,
    ) -> Result<Option<Box<dyn Product>>, ProductError> {
        self.kind(&product.product_type)?
            .load(product.product_uuid)
            .await
    }

    /// Delete the record behind a product reference.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError::UnknownType`] for an unregistered tag, or the
    /// kind's own storage error.
    pub async fn delete(&self, product: &ProductRef) -> Result<u64, ProductError> {
        self.kind(&product.product_type)?
            .delete(product.product_uuid)
            .await
    }
}
