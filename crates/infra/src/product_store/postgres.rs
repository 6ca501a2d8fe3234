//! Postgres-backed product store.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Duplicate` | title or slug already taken |
//! | Database (not-null violation) | `23502` | `MissingValue` | required column left empty |
//! | Database (check constraint violation) | `23514` | `InvalidValue` | e.g. empty image url, negative stock |
//! | Database (other) | Any other | `Backend` | Other database errors |
//! | Any other variant | N/A | `Backend` | Network errors, pool closed, etc. |
//!
//! The constraint detail reported by Postgres (e.g. `Key (title)=(Blue Shoes) already exists.`)
//! is carried in the error so the caller can surface it.

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use catalog_core::{ImageId, ProductId};
use catalog_products::{Page, Product, ProductImage};

use super::r#trait::{ProductStore, StoreError};
use crate::config::DatabaseConfig;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        product_id  UUID PRIMARY KEY,
        title       TEXT NOT NULL UNIQUE,
        price       DOUBLE PRECISION NOT NULL,
        description TEXT,
        slug        TEXT NOT NULL UNIQUE,
        stock       INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
        sizes       TEXT[] NOT NULL DEFAULT '{}',
        gender      TEXT NOT NULL,
        tags        TEXT[] NOT NULL DEFAULT '{}'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS product_images (
        product_image_id UUID PRIMARY KEY,
        url              TEXT NOT NULL CHECK (url <> ''),
        position         INTEGER NOT NULL,
        product_id       UUID NOT NULL REFERENCES products (product_id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS product_images_product_id_idx
        ON product_images (product_id, position)
    "#,
];

const PRODUCT_COLUMNS: &str =
    "product_id, title, price, description, slug, stock, sizes, gender, tags";

/// Postgres-backed product store.
///
/// Uses a SQLx connection pool (cheap to clone, `Send + Sync`). Multi-row writes
/// (insert with images, update with image replacement) run inside a single
/// transaction that is rolled back on the first failure.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool for `config`.
    #[instrument(skip(config), fields(host = %config.host, database = %config.name), err)]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    async fn insert_images(
        tx: &mut Transaction<'static, Postgres>,
        product_id: ProductId,
        images: &[ProductImage],
    ) -> Result<(), StoreError> {
        for (position, image) in images.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO product_images (product_image_id, url, position, product_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(image.id.as_uuid())
            .bind(&image.url)
            .bind(position as i32)
            .bind(product_id.as_uuid())
            .execute(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_image", e))?;
        }
        Ok(())
    }

    /// Attach images to already-loaded product rows.
    async fn with_images(&self, rows: Vec<PgRow>) -> Result<Vec<Product>, StoreError> {
        let mut products = rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        if products.is_empty() {
            return Ok(products);
        }

        let ids: Vec<Uuid> = products.iter().map(|p| *p.id.as_uuid()).collect();
        let image_rows = sqlx::query(
            r#"
            SELECT product_image_id, url, product_id
            FROM product_images
            WHERE product_id = ANY($1)
            ORDER BY product_id, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_images", e))?;

        for row in image_rows {
            let owner: Uuid = row.try_get("product_id").map_err(row_error)?;
            let image = ProductImage {
                id: ImageId::from_uuid(row.try_get("product_image_id").map_err(row_error)?),
                url: row.try_get("url").map_err(row_error)?,
            };
            if let Some(product) = products.iter_mut().find(|p| *p.id.as_uuid() == owner) {
                product.images.push(image);
            }
        }
        Ok(products)
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self, product), fields(product_id = %product.id, images = product.images.len()), err)]
    async fn insert(&self, product: &Product) -> Result<(), StoreError> {
        let mut tx = self.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO products (
                product_id, title, price, description, slug, stock, sizes, gender, tags
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.title)
        .bind(product.price)
        .bind(&product.description)
        .bind(&product.slug)
        .bind(product.stock)
        .bind(&product.sizes)
        .bind(product.gender.as_str())
        .bind(&product.tags)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e));

        if let Err(e) = inserted {
            return finish(tx, Err(e)).await;
        }
        let result = Self::insert_images(&mut tx, product.id, &product.images).await;
        finish(tx, result).await
    }

    #[instrument(skip(self), fields(limit = page.limit(), offset = page.offset()), err)]
    async fn list(&self, page: Page) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY title ASC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.limit()))
        .bind(i64::from(page.offset()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        self.with_images(rows).await
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_id", e))?;

        Ok(self.with_images(row.into_iter().collect()).await?.pop())
    }

    #[instrument(skip(self), err)]
    async fn find_by_title_or_slug(&self, term: &str) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE title = $1 OR slug = $1 LIMIT 1"
        ))
        .bind(term)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_title_or_slug", e))?;

        Ok(self.with_images(row.into_iter().collect()).await?.pop())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn update(&self, product: &Product, replace_images: bool) -> Result<bool, StoreError> {
        let mut tx = self.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE products SET
                title = $2,
                price = $3,
                description = $4,
                slug = $5,
                stock = $6,
                sizes = $7,
                gender = $8,
                tags = $9
            WHERE product_id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.title)
        .bind(product.price)
        .bind(&product.description)
        .bind(&product.slug)
        .bind(product.stock)
        .bind(&product.sizes)
        .bind(product.gender.as_str())
        .bind(&product.tags)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_product", e));

        let found = match updated {
            Ok(done) => done.rows_affected() > 0,
            Err(e) => return finish(tx, Err(e)).await.map(|_| false),
        };
        if !found {
            rollback(tx).await;
            return Ok(false);
        }

        let result = if replace_images {
            replace_product_images(&mut tx, product).await
        } else {
            Ok(())
        };
        finish(tx, result).await.map(|_| true)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let done = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        Ok(done.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete_all(&self) -> Result<u64, StoreError> {
        let done = sqlx::query("DELETE FROM products")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_all_products", e))?;
        Ok(done.rows_affected())
    }
}

async fn replace_product_images(
    tx: &mut Transaction<'static, Postgres>,
    product: &Product,
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM product_images WHERE product_id = $1")
        .bind(product.id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("delete_images", e))?;
    PostgresProductStore::insert_images(tx, product.id, &product.images).await
}

/// Commit on success, roll back on failure (returning the original error).
async fn finish(
    tx: Transaction<'static, Postgres>,
    result: Result<(), StoreError>,
) -> Result<(), StoreError> {
    match result {
        Ok(()) => tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e)),
        Err(err) => {
            rollback(tx).await;
            Err(err)
        }
    }
}

async fn rollback(tx: Transaction<'static, Postgres>) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(error = %e, "transaction rollback failed");
    }
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let gender: String = row.try_get("gender").map_err(row_error)?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("product_id").map_err(row_error)?),
        title: row.try_get("title").map_err(row_error)?,
        price: row.try_get("price").map_err(row_error)?,
        description: row.try_get("description").map_err(row_error)?,
        slug: row.try_get("slug").map_err(row_error)?,
        stock: row.try_get("stock").map_err(row_error)?,
        sizes: row.try_get("sizes").map_err(row_error)?,
        gender: gender
            .parse()
            .map_err(|e| StoreError::Backend(format!("corrupt gender column: {e}")))?,
        tags: row.try_get("tags").map_err(row_error)?,
        images: Vec::new(),
    })
}

fn row_error(err: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("failed to decode row: {err}"))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let detail = db_err
                .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .and_then(|pg| pg.detail())
                .map(str::to_string)
                .unwrap_or_else(|| db_err.message().to_string());
            let code = db_err.code().map(|c| c.into_owned());
            classify_database_error(operation, code.as_deref(), detail)
        }
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

/// Classify a Postgres SQLSTATE into a `StoreError`.
fn classify_database_error(operation: &str, code: Option<&str>, detail: String) -> StoreError {
    match code {
        Some("23505") => StoreError::Duplicate(detail),
        Some("23502") => StoreError::MissingValue(detail),
        Some("23514") => StoreError::InvalidValue(detail),
        _ => StoreError::Backend(format!("database error in {operation}: {detail}")),
    }
}
