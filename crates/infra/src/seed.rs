//! Fixed product set used to (re)populate non-production databases.

use catalog_products::NewProduct;

const SEED_PRODUCTS_JSON: &str = include_str!("../seed/products.json");

/// The seed products, in file order.
pub fn seed_products() -> Result<Vec<NewProduct>, serde_json::Error> {
    serde_json::from_str(SEED_PRODUCTS_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use catalog_core::ProductId;

    #[test]
    fn seed_file_parses_into_valid_products() {
        let products = seed_products().unwrap();
        assert!(!products.is_empty());

        let mut titles = HashSet::new();
        let mut slugs = HashSet::new();
        for input in products {
            let product = input.into_product(ProductId::new()).unwrap();
            assert!(titles.insert(product.title.clone()), "duplicate title {}", product.title);
            assert!(slugs.insert(product.slug.clone()), "duplicate slug {}", product.slug);
            assert!(!product.images.is_empty());
        }
    }
}
