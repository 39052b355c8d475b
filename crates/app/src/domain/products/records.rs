//! Product Records

use std::{
    borrow::Cow,
    fmt::{Display, Formatter, Result as FmtResult},
};

use crate::uuids::TypedUuid;

/// Product Record
#[derive(Debug)]
pub struct ProductRecord;

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Names a product variant, e.g. `ticket` or `voucher`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductTypeTag(Cow<'static, str>);

impl ProductTypeTag {
    pub const VOUCHER: Self = Self(Cow::Borrowed("voucher"));
    pub const TICKET: Self = Self(Cow::Borrowed("ticket"));
    pub const PACKAGE: Self = Self(Cow::Borrowed("packageproduct"));

    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(Cow::Owned(tag.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ProductTypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Lookup key for the product behind a cart item.
///
/// This is a reference, not ownership: the product record may be deleted
/// independently, leaving the cart item as a tombstone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductRef {
    pub product_type: ProductTypeTag,
    pub product_uuid: ProductUuid,
}

impl ProductRef {
    #[must_use]
    pub const fn new(product_type: ProductTypeTag, product_uuid: ProductUuid) -> Self {
        Self {
            product_type,
            product_uuid,
        }
    }

    #[must_use]
    pub fn is_ticket(&self) -> bool {
        self.product_type == ProductTypeTag::TICKET
    }

    #[must_use]
    pub fn is_package(&self) -> bool {
        self.product_type == ProductTypeTag::PACKAGE
    }
}

impl Display for ProductRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.product_type, self.product_uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrowed_and_owned_tags_compare_equal() {
        assert_eq!(ProductTypeTag::new("ticket"), ProductTypeTag::TICKET);
    }

    #[test]
    fn product_ref_displays_type_and_uuid() {
        let uuid = ProductUuid::new();
        let product = ProductRef::new(ProductTypeTag::VOUCHER, uuid);

        assert_eq!(product.to_string(), format!("voucher/{uuid}"));
        assert!(!product.is_ticket());
    }
}
