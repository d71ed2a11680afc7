//! Product context carried through the intake session.

use crate::error::{AttestError, Result};
use serde::{Deserialize, Serialize};

/// Light product context sent with every backend call.
///
/// `product_id` identifies the marketplace product being certified and keys
/// the report cache; the rest is descriptive context for the reasoning
/// service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductContext {
    pub product_id: String,
    pub category: String,
    pub subcategory: String,
    pub company_name: String,
    pub location: String,
    #[serde(default)]
    pub certifications: Vec<String>,
}

impl ProductContext {
    /// Creates a context for the given product with everything else unset.
    pub fn for_product(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            ..Self::default()
        }
    }

    /// Validates that the context is ready to start the conversational loop.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error when the category or subcategory is
    /// missing; the category-select screen must refuse the transition.
    pub fn validate_for_start(&self) -> Result<()> {
        if self.category.trim().is_empty() {
            return Err(AttestError::validation("Please select a category"));
        }
        if self.subcategory.trim().is_empty() {
            return Err(AttestError::validation("Please select a subcategory"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_requires_category_and_subcategory() {
        let mut product = ProductContext::for_product("prod-1");
        assert!(product.validate_for_start().is_err());

        product.category = "agriculture".to_string();
        assert!(product.validate_for_start().is_err());

        product.subcategory = "Organic Farming".to_string();
        assert!(product.validate_for_start().is_ok());
    }

    #[test]
    fn whitespace_only_values_are_rejected() {
        let mut product = ProductContext::for_product("prod-1");
        product.category = "  ".to_string();
        product.subcategory = "Organic Farming".to_string();
        assert!(product.validate_for_start().is_err());
    }
}
