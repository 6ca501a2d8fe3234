use std::sync::RwLock;

use async_trait::async_trait;

use catalog_core::ProductId;
use catalog_products::{Page, Product};

use super::r#trait::{ProductStore, StoreError};

/// In-memory product store.
///
/// Intended for tests/dev. Enforces the same constraints as the SQL schema
/// (unique title/slug, non-empty image urls) so both backends fail the same way.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }

    /// Check the constraints a row must satisfy against every *other* stored row.
    fn check_constraints(existing: &[Product], candidate: &Product) -> Result<(), StoreError> {
        for other in existing.iter().filter(|p| p.id != candidate.id) {
            if other.title == candidate.title {
                return Err(StoreError::Duplicate(format!(
                    "Key (title)=({}) already exists.",
                    candidate.title
                )));
            }
            if other.slug == candidate.slug {
                return Err(StoreError::Duplicate(format!(
                    "Key (slug)=({}) already exists.",
                    candidate.slug
                )));
            }
        }
        if candidate.slug.is_empty() {
            return Err(StoreError::MissingValue(
                "null value in column \"slug\"".to_string(),
            ));
        }
        Ok(())
    }

    fn check_images(product: &Product) -> Result<(), StoreError> {
        if let Some(idx) = product.images.iter().position(|i| i.url.is_empty()) {
            return Err(StoreError::InvalidValue(format!(
                "image at position {idx} has an empty url"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        let mut products = self.products.write().map_err(|_| Self::poisoned())?;
        if products.iter().any(|p| p.id == product.id) {
            return Err(StoreError::Duplicate(format!(
                "Key (product_id)=({}) already exists.",
                product.id
            )));
        }
        Self::check_constraints(&products, product)?;
        Self::check_images(product)?;
        products.push(product.clone());
        Ok(())
    }

    async fn list(&self, page: Page) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        let mut sorted: Vec<&Product> = products.iter().collect();
        sorted.sort_by(|a, b| a.title.cmp(&b.title));
        let range = page.bounds(sorted.len());
        Ok(sorted[range].iter().map(|p| (*p).clone()).collect())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_title_or_slug(&self, term: &str) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        Ok(products.iter().find(|p| p.matches_term(term)).cloned())
    }

    async fn update(&self, product: &Product, replace_images: bool) -> Result<bool, StoreError> {
        // Single write lock for the whole update: validate first, then swap in.
        let mut products = self.products.write().map_err(|_| Self::poisoned())?;
        let Some(idx) = products.iter().position(|p| p.id == product.id) else {
            return Ok(false);
        };
        Self::check_constraints(&products, product)?;

        let mut next = product.clone();
        if replace_images {
            Self::check_images(&next)?;
        } else {
            next.images = products[idx].images.clone();
        }
        products[idx] = next;
        Ok(true)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut products = self.products.write().map_err(|_| Self::poisoned())?;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let mut products = self.products.write().map_err(|_| Self::poisoned())?;
        let removed = products.len() as u64;
        products.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_products::{Gender, NewProduct, ProductChanges, ProductImage};

    fn product(title: &str, images: &[&str]) -> Product {
        NewProduct {
            title: title.to_string(),
            price: 40.0,
            description: None,
            slug: None,
            stock: 0,
            sizes: vec!["M".to_string()],
            gender: Gender::Unisex,
            tags: vec![],
            images: images.iter().map(|s| s.to_string()).collect(),
        }
        .into_product(ProductId::new())
        .unwrap()
    }

    #[tokio::test]
    async fn insert_then_find_by_id_and_slug() {
        let store = InMemoryProductStore::new();
        let p = product("Blue Shoes", &["a.png"]);
        store.insert(&p).await.unwrap();

        let by_id = store.find_by_id(p.id).await.unwrap().unwrap();
        let by_slug = store.find_by_title_or_slug("blue_shoes").await.unwrap().unwrap();
        let by_title = store.find_by_title_or_slug("Blue Shoes").await.unwrap().unwrap();
        assert_eq!(by_id, by_slug);
        assert_eq!(by_id, by_title);
        assert_eq!(by_id.image_urls(), vec!["a.png"]);
    }

    #[tokio::test]
    async fn duplicate_title_is_rejected_without_side_effects() {
        let store = InMemoryProductStore::new();
        store.insert(&product("Blue Shoes", &[])).await.unwrap();

        let err = store.insert(&product("Blue Shoes", &[])).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.list(Page::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let store = InMemoryProductStore::new();
        store.insert(&product("Blue Shoes", &[])).await.unwrap();

        let mut other = product("Navy Shoes", &[]);
        other.slug = "blue_shoes".to_string();
        let err = store.insert(&other).await.unwrap_err();
        match err {
            StoreError::Duplicate(detail) => assert!(detail.contains("slug")),
            other => panic!("expected Duplicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_is_paged_and_ordered_by_title() {
        let store = InMemoryProductStore::new();
        for title in ["Delta Tee", "Alpha Tee", "Charlie Tee", "Bravo Tee"] {
            store.insert(&product(title, &[])).await.unwrap();
        }

        let page = Page::new(Some(2), Some(1)).unwrap();
        let titles: Vec<String> = store
            .list(page)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["Bravo Tee", "Charlie Tee"]);

        let past_end = Page::new(Some(5), Some(10)).unwrap();
        assert!(store.list(past_end).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_images() {
        let store = InMemoryProductStore::new();
        let p = product("Blue Shoes", &["a.png"]);
        store.insert(&p).await.unwrap();

        let changes = ProductChanges {
            images: Some(vec!["b.png".to_string(), "c.png".to_string()]),
            ..ProductChanges::default()
        };
        let next = changes.apply_to(&p).unwrap();
        assert!(store.update(&next, true).await.unwrap());

        let stored = store.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored.image_urls(), vec!["b.png", "c.png"]);
    }

    #[tokio::test]
    async fn update_without_image_replacement_keeps_stored_images() {
        let store = InMemoryProductStore::new();
        let p = product("Blue Shoes", &["a.png"]);
        store.insert(&p).await.unwrap();

        let mut next = p.clone();
        next.stock = 12;
        next.images.clear();
        assert!(store.update(&next, false).await.unwrap());

        let stored = store.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 12);
        assert_eq!(stored.image_urls(), vec!["a.png"]);
    }

    #[tokio::test]
    async fn failed_image_replacement_leaves_product_untouched() {
        let store = InMemoryProductStore::new();
        let p = product("Blue Shoes", &["a.png"]);
        store.insert(&p).await.unwrap();

        let mut next = p.clone();
        next.stock = 99;
        next.images = vec![ProductImage::new("b.png"), ProductImage::new("")];
        let err = store.update(&next, true).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidValue(_)));

        let stored = store.find_by_id(p.id).await.unwrap().unwrap();
        assert_eq!(stored, p);
    }

    #[tokio::test]
    async fn update_into_existing_title_is_a_duplicate() {
        let store = InMemoryProductStore::new();
        let blue = product("Blue Shoes", &[]);
        store.insert(&blue).await.unwrap();
        store.insert(&product("Red Shoes", &[])).await.unwrap();

        let mut next = blue.clone();
        next.title = "Red Shoes".to_string();
        let err = store.update(&next, false).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn update_of_unknown_product_reports_missing() {
        let store = InMemoryProductStore::new();
        assert!(!store.update(&product("Blue Shoes", &[]), false).await.unwrap());
    }

    #[tokio::test]
    async fn delete_and_delete_all() {
        let store = InMemoryProductStore::new();
        let p = product("Blue Shoes", &["a.png"]);
        store.insert(&p).await.unwrap();
        store.insert(&product("Red Shoes", &[])).await.unwrap();

        assert!(store.delete(p.id).await.unwrap());
        assert!(!store.delete(p.id).await.unwrap());
        assert!(store.find_by_id(p.id).await.unwrap().is_none());

        assert_eq!(store.delete_all().await.unwrap(), 1);
        assert!(store.list(Page::default()).await.unwrap().is_empty());
    }
}
