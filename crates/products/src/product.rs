use serde::{Deserialize, Serialize};

use catalog_core::{DomainError, DomainResult, ImageId, ProductId};

use crate::slug::normalize_slug;

/// Minimum length of a product title (after trimming).
pub const MIN_TITLE_LEN: usize = 4;

/// Target audience of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
    Kids,
    Unisex,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Men => "men",
            Gender::Women => "women",
            Gender::Kids => "kids",
            Gender::Unisex => "unisex",
        }
    }
}

impl core::fmt::Display for Gender {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Gender {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "men" => Ok(Gender::Men),
            "women" => Ok(Gender::Women),
            "kids" => Ok(Gender::Kids),
            "unisex" => Ok(Gender::Unisex),
            other => Err(DomainError::validation(format!(
                "gender must be one of: men, women, kids, unisex (got '{other}')"
            ))),
        }
    }
}

/// An image owned by exactly one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ImageId,
    pub url: String,
}

impl ProductImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: ImageId::new(),
            url: url.into(),
        }
    }
}

/// A catalog product together with its ordered images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    pub description: Option<String>,
    pub slug: String,
    pub stock: i32,
    pub sizes: Vec<String>,
    pub gender: Gender,
    pub tags: Vec<String>,
    pub images: Vec<ProductImage>,
}

impl Product {
    /// Image URLs in their stored order.
    pub fn image_urls(&self) -> Vec<String> {
        self.images.iter().map(|i| i.url.clone()).collect()
    }

    /// Whether `term` names this product by title or slug (exact match).
    pub fn matches_term(&self, term: &str) -> bool {
        self.title == term || self.slug == term
    }

    fn validate(&self) -> DomainResult<()> {
        if self.title.chars().count() < MIN_TITLE_LEN {
            return Err(DomainError::validation(format!(
                "title must be at least {MIN_TITLE_LEN} characters long"
            )));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(DomainError::validation("price must be a positive number"));
        }
        if self.stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        if self.slug.is_empty() {
            return Err(DomainError::validation("slug cannot be empty"));
        }
        if self.sizes.iter().any(|s| s.trim().is_empty()) {
            return Err(DomainError::validation("sizes cannot contain empty values"));
        }
        if self.images.iter().any(|i| i.url.trim().is_empty()) {
            return Err(DomainError::validation("image url cannot be empty"));
        }
        Ok(())
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub stock: i32,
    pub sizes: Vec<String>,
    pub gender: Gender,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewProduct {
    /// Validate the input and build the product to persist under `id`.
    ///
    /// The slug falls back to the title and is normalized either way.
    pub fn into_product(self, id: ProductId) -> DomainResult<Product> {
        let slug = normalize_slug(self.slug.as_deref().unwrap_or(&self.title));
        let product = Product {
            id,
            title: self.title,
            price: self.price,
            description: self.description,
            slug,
            stock: self.stock,
            sizes: self.sizes,
            gender: self.gender,
            tags: self.tags,
            images: self.images.into_iter().map(ProductImage::new).collect(),
        };
        product.validate()?;
        Ok(product)
    }
}

/// A partial update: every field left as `None` keeps its current value.
///
/// `description` is doubly optional: `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub description: Option<Option<String>>,
    pub slug: Option<String>,
    pub stock: Option<i32>,
    pub sizes: Option<Vec<String>>,
    pub gender: Option<Gender>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

impl ProductChanges {
    /// Whether this update replaces the image set.
    pub fn replaces_images(&self) -> bool {
        self.images.is_some()
    }

    /// Merge the changes into `current`, returning the updated product.
    ///
    /// The slug is re-normalized unconditionally. `current` is left untouched
    /// when the merged product fails validation.
    pub fn apply_to(self, current: &Product) -> DomainResult<Product> {
        let mut next = current.clone();
        if let Some(title) = self.title {
            next.title = title;
        }
        if let Some(price) = self.price {
            next.price = price;
        }
        if let Some(description) = self.description {
            next.description = description;
        }
        if let Some(slug) = self.slug {
            next.slug = slug;
        }
        if let Some(stock) = self.stock {
            next.stock = stock;
        }
        if let Some(sizes) = self.sizes {
            next.sizes = sizes;
        }
        if let Some(gender) = self.gender {
            next.gender = gender;
        }
        if let Some(tags) = self.tags {
            next.tags = tags;
        }
        if let Some(images) = self.images {
            next.images = images.into_iter().map(ProductImage::new).collect();
        }
        next.slug = normalize_slug(&next.slug);
        next.validate()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blue_shoes() -> NewProduct {
        NewProduct {
            title: "Blue Shoes".to_string(),
            price: 40.0,
            description: None,
            slug: None,
            stock: 0,
            sizes: vec!["M".to_string()],
            gender: Gender::Unisex,
            tags: vec![],
            images: vec![],
        }
    }

    fn created(input: NewProduct) -> Product {
        input.into_product(ProductId::new()).unwrap()
    }

    #[test]
    fn slug_is_derived_from_title() {
        let product = created(blue_shoes());
        assert_eq!(product.slug, "blue_shoes");
    }

    #[test]
    fn supplied_slug_is_normalized_on_create() {
        let mut input = blue_shoes();
        input.slug = Some("Kid's Blue Shoes".to_string());
        assert_eq!(created(input).slug, "kids_blue_shoes");
    }

    #[test]
    fn images_keep_their_order() {
        let mut input = blue_shoes();
        input.images = vec!["a.png".to_string(), "b.png".to_string()];
        let product = created(input);
        assert_eq!(product.image_urls(), vec!["a.png", "b.png"]);
        assert_ne!(product.images[0].id, product.images[1].id);
    }

    #[test]
    fn short_title_is_rejected() {
        let mut input = blue_shoes();
        input.title = "Hat".to_string();
        let err = input.into_product(ProductId::new()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn title_length_counts_surrounding_whitespace() {
        let mut input = blue_shoes();
        input.title = "  ab  ".to_string();
        assert_eq!(created(input).title, "  ab  ");
    }

    #[test]
    fn non_positive_price_is_rejected() {
        for price in [0.0, -1.0, f64::NAN] {
            let mut input = blue_shoes();
            input.price = price;
            assert!(input.into_product(ProductId::new()).is_err(), "price {price} accepted");
        }
    }

    #[test]
    fn negative_stock_is_rejected() {
        let mut input = blue_shoes();
        input.stock = -3;
        assert!(input.into_product(ProductId::new()).is_err());
    }

    #[test]
    fn empty_image_url_is_rejected() {
        let mut input = blue_shoes();
        input.images = vec!["".to_string()];
        assert!(input.into_product(ProductId::new()).is_err());
    }

    #[test]
    fn new_product_deserializes_with_defaults() {
        let input: NewProduct = serde_json::from_value(serde_json::json!({
            "title": "Blue Shoes",
            "price": 40,
            "gender": "unisex",
            "sizes": ["M"]
        }))
        .unwrap();
        assert_eq!(input, blue_shoes());
    }

    #[test]
    fn unknown_gender_is_rejected() {
        let err = "aliens".parse::<Gender>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!("kids".parse::<Gender>().unwrap(), Gender::Kids);
    }

    #[test]
    fn update_renormalizes_existing_slug() {
        let mut product = created(blue_shoes());
        product.slug = "Legacy Slug".to_string();
        let updated = ProductChanges::default().apply_to(&product).unwrap();
        assert_eq!(updated.slug, "legacy_slug");
    }

    #[test]
    fn update_with_new_title_keeps_slug() {
        let product = created(blue_shoes());
        let changes = ProductChanges {
            title: Some("Red Shoes".to_string()),
            ..ProductChanges::default()
        };
        let updated = changes.apply_to(&product).unwrap();
        assert_eq!(updated.title, "Red Shoes");
        assert_eq!(updated.slug, "blue_shoes");
    }

    #[test]
    fn update_replaces_images_only_when_supplied() {
        let mut input = blue_shoes();
        input.images = vec!["a.png".to_string()];
        let product = created(input);

        let untouched = ProductChanges {
            stock: Some(7),
            ..ProductChanges::default()
        };
        assert!(!untouched.replaces_images());
        let updated = untouched.apply_to(&product).unwrap();
        assert_eq!(updated.images, product.images);
        assert_eq!(updated.stock, 7);

        let replaced = ProductChanges {
            images: Some(vec!["b.png".to_string(), "c.png".to_string()]),
            ..ProductChanges::default()
        };
        assert!(replaced.replaces_images());
        let updated = replaced.apply_to(&product).unwrap();
        assert_eq!(updated.image_urls(), vec!["b.png", "c.png"]);
    }

    #[test]
    fn update_can_clear_description() {
        let mut input = blue_shoes();
        input.description = Some("Canvas".to_string());
        let product = created(input);

        let kept = ProductChanges::default().apply_to(&product).unwrap();
        assert_eq!(kept.description.as_deref(), Some("Canvas"));

        let cleared = ProductChanges {
            description: Some(None),
            ..ProductChanges::default()
        };
        assert_eq!(cleared.apply_to(&product).unwrap().description, None);
    }

    #[test]
    fn invalid_update_is_rejected() {
        let product = created(blue_shoes());
        let changes = ProductChanges {
            price: Some(-5.0),
            ..ProductChanges::default()
        };
        assert!(changes.apply_to(&product).is_err());
    }

    #[test]
    fn matches_term_by_title_or_slug() {
        let product = created(blue_shoes());
        assert!(product.matches_term("Blue Shoes"));
        assert!(product.matches_term("blue_shoes"));
        assert!(!product.matches_term("blue shoes"));
    }
}
