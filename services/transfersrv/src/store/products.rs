//! Product catalog
//!
//! Source: live rows of `product_details` with their slot-1 image.
//! Target: the web database's `product` table.

use anyhow::Context;
use async_trait::async_trait;
use catalog_recon::{KeyedRecord, RecordSource, RecordTarget, TargetKey};
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlPool, MySqlRow};
use tracing::debug;

use super::{opt_text, price, text};

// One image per product: the slot-1 join is collapsed so a tag never repeats.
// Prices are cast so FLOAT, DOUBLE and DECIMAL columns all decode as f64.
const SELECT_SOURCE: &str = r#"
    SELECT ProductTitle, ProductDesc,
           CAST(MRP AS DOUBLE) AS MRP, CAST(SellingPrice AS DOUBLE) AS SellingPrice, tag,
           CAST(DateCreated AS CHAR) AS DateCreated, img.img_name
    FROM product_details
    LEFT JOIN (
        SELECT product_tag, MIN(img_name) AS img_name
        FROM img_details
        WHERE img_slot = '1'
        GROUP BY product_tag
    ) AS img ON product_details.tag = img.product_tag
    WHERE Deleted = 0
"#;

const SELECT_TARGET_KEYS: &str = "SELECT name, tag FROM product";

const INSERT_TARGET: &str = r#"
    INSERT INTO product (id_category, name, description, price, mrp, date_created, thumbnail, tag)
    VALUES (0, ?, ?, ?, ?, ?, ?, ?)
"#;

const DELETE_TARGET: &str = "DELETE FROM product WHERE tag = ?";

/// A product as stored in the production database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProduct {
    pub title: String,
    pub description: String,
    pub mrp: f32,
    pub selling_price: f32,
    pub tag: String,
    pub date_created: String,
    /// Slot-1 image, used as the web thumbnail
    pub image_name: Option<String>,
}

impl KeyedRecord for SourceProduct {
    fn tag(&self) -> &str {
        &self.tag
    }
}

fn hydrate_product(row: &MySqlRow) -> anyhow::Result<SourceProduct> {
    Ok(SourceProduct {
        title: text(row, "ProductTitle")?,
        description: opt_text(row, "ProductDesc")?.unwrap_or_default(),
        mrp: price(row, "MRP")?,
        selling_price: price(row, "SellingPrice")?,
        tag: text(row, "tag")?,
        date_created: opt_text(row, "DateCreated")?.unwrap_or_default(),
        image_name: opt_text(row, "img_name")?,
    })
}

pub struct MySqlProductSource {
    pool: MySqlPool,
}

impl MySqlProductSource {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSource<SourceProduct> for MySqlProductSource {
    fn name(&self) -> &str {
        "production.product_details"
    }

    async fn fetch_all(&self) -> anyhow::Result<Vec<SourceProduct>> {
        let rows = sqlx::query(SELECT_SOURCE)
            .fetch_all(&self.pool)
            .await
            .context("select product_details")?;

        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            products.push(hydrate_product(row)?);
        }
        debug!("Fetched {} source products", products.len());
        Ok(products)
    }
}

pub struct MySqlProductTarget {
    pool: MySqlPool,
}

impl MySqlProductTarget {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordTarget<SourceProduct> for MySqlProductTarget {
    fn name(&self) -> &str {
        "web.product"
    }

    async fn fetch_keys(&self) -> anyhow::Result<Vec<TargetKey>> {
        let rows = sqlx::query(SELECT_TARGET_KEYS)
            .fetch_all(&self.pool)
            .await
            .context("select product keys")?;

        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            let key = TargetKey::new(text(row, "tag")?);
            keys.push(match opt_text(row, "name")? {
                Some(name) => key.with_name(name),
                None => key,
            });
        }
        Ok(keys)
    }

    async fn insert(&self, record: &SourceProduct) -> anyhow::Result<()> {
        sqlx::query(INSERT_TARGET)
            .bind(&record.title)
            .bind(&record.description)
            .bind(record.selling_price)
            .bind(record.mrp)
            .bind(&record.date_created)
            .bind(&record.image_name)
            .bind(&record.tag)
            .execute(&self.pool)
            .await
            .with_context(|| format!("insert product {}", record.tag))?;
        Ok(())
    }

    async fn delete(&self, tag: &str) -> anyhow::Result<u64> {
        let result = sqlx::query(DELETE_TARGET)
            .bind(tag)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete product {}", tag))?;
        Ok(result.rows_affected())
    }
}
