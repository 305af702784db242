//! Shop catalog
//!
//! Source: live rows of `shop_details`. Target: the web database's `shop`
//! table.

use anyhow::Context;
use async_trait::async_trait;
use catalog_recon::{KeyedRecord, RecordSource, RecordTarget, TargetKey};
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlPool, MySqlRow};
use tracing::debug;

use super::{opt_text, text};

const SELECT_SOURCE: &str = r#"
    SELECT ShopName, ShopAddress, Phone, tag, CAST(DateCreated AS CHAR) AS DateCreated
    FROM shop_details
    WHERE Deleted = 0
"#;

const SELECT_TARGET_KEYS: &str = "SELECT name, tag FROM shop";

const INSERT_TARGET: &str = r#"
    INSERT INTO shop (name, address, phone, date_created, tag)
    VALUES (?, ?, ?, ?, ?)
"#;

const DELETE_TARGET: &str = "DELETE FROM shop WHERE tag = ?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceShop {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub tag: String,
    pub date_created: String,
}

impl KeyedRecord for SourceShop {
    fn tag(&self) -> &str {
        &self.tag
    }
}

fn hydrate_shop(row: &MySqlRow) -> anyhow::Result<SourceShop> {
    Ok(SourceShop {
        name: text(row, "ShopName")?,
        address: opt_text(row, "ShopAddress")?.unwrap_or_default(),
        phone: opt_text(row, "Phone")?.unwrap_or_default(),
        tag: text(row, "tag")?,
        date_created: opt_text(row, "DateCreated")?.unwrap_or_default(),
    })
}

pub struct MySqlShopSource {
    pool: MySqlPool,
}

impl MySqlShopSource {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSource<SourceShop> for MySqlShopSource {
    fn name(&self) -> &str {
        "production.shop_details"
    }

    async fn fetch_all(&self) -> anyhow::Result<Vec<SourceShop>> {
        let rows = sqlx::query(SELECT_SOURCE)
            .fetch_all(&self.pool)
            .await
            .context("select shop_details")?;

        let shops = rows
            .iter()
            .map(hydrate_shop)
            .collect::<anyhow::Result<Vec<_>>>()?;
        debug!("Fetched {} source shops", shops.len());
        Ok(shops)
    }
}

pub struct MySqlShopTarget {
    pool: MySqlPool,
}

impl MySqlShopTarget {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordTarget<SourceShop> for MySqlShopTarget {
    fn name(&self) -> &str {
        "web.shop"
    }

    async fn fetch_keys(&self) -> anyhow::Result<Vec<TargetKey>> {
        let rows = sqlx::query(SELECT_TARGET_KEYS)
            .fetch_all(&self.pool)
            .await
            .context("select shop keys")?;

        rows.iter()
            .map(|row| {
                let key = TargetKey::new(text(row, "tag")?);
                Ok(match opt_text(row, "name")? {
                    Some(name) => key.with_name(name),
                    None => key,
                })
            })
            .collect()
    }

    async fn insert(&self, record: &SourceShop) -> anyhow::Result<()> {
        sqlx::query(INSERT_TARGET)
            .bind(&record.name)
            .bind(&record.address)
            .bind(&record.phone)
            .bind(&record.date_created)
            .bind(&record.tag)
            .execute(&self.pool)
            .await
            .with_context(|| format!("insert shop {}", record.tag))?;
        Ok(())
    }

    async fn delete(&self, tag: &str) -> anyhow::Result<u64> {
        let result = sqlx::query(DELETE_TARGET)
            .bind(tag)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete shop {}", tag))?;
        Ok(result.rows_affected())
    }
}
