use serde::{Deserialize, Deserializer};

use catalog_core::DomainResult;
use catalog_products::{Gender, NewProduct, Product, ProductChanges};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub price: f64,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub stock: Option<i32>,
    pub sizes: Vec<String>,
    pub gender: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> DomainResult<NewProduct> {
        Ok(NewProduct {
            gender: self.gender.parse()?,
            title: self.title,
            price: self.price,
            description: self.description,
            slug: self.slug,
            stock: self.stock.unwrap_or(0),
            sizes: self.sizes,
            tags: self.tags,
            images: self.images,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub price: Option<f64>,
    /// Absent keeps the stored value, `null` clears it.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub slug: Option<String>,
    pub stock: Option<i32>,
    pub sizes: Option<Vec<String>>,
    pub gender: Option<String>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

impl UpdateProductRequest {
    pub fn into_changes(self) -> DomainResult<ProductChanges> {
        let gender = self.gender.map(|g| g.parse::<Gender>()).transpose()?;
        Ok(ProductChanges {
            title: self.title,
            price: self.price,
            description: self.description,
            slug: self.slug,
            stock: self.stock,
            sizes: self.sizes,
            gender,
            tags: self.tags,
            images: self.images,
        })
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

/// Public product view: images flattened to their URLs, sizes and gender left out.
pub fn product_to_json(product: Product) -> serde_json::Value {
    let images = product.image_urls();
    serde_json::json!({
        "id": product.id.to_string(),
        "title": product.title,
        "description": product.description,
        "price": product.price,
        "stock": product.stock,
        "slug": product.slug,
        "tags": product.tags,
        "images": images,
    })
}
