// src/models/stock.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::order::validate_not_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_reason", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockReason {
    Venda,
    Estorno,
    Ajuste,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Água mineral 500ml")]
    pub name: String,
    /// Pode ficar negativo quando se vende sem estoque lançado.
    #[schema(example = "48")]
    pub quantity: Decimal,
    #[schema(example = "1.20")]
    pub cost_price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub sku_id: Option<Uuid>,
    #[schema(example = "Água mineral 500ml")]
    pub name: String,
    #[schema(example = "Bebidas")]
    pub category: String,
    #[schema(example = "3.50")]
    pub price: Decimal,
    pub image_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockTransaction {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub sku_id: Uuid,
    pub order_id: Option<Uuid>,
    /// Com sinal: negativo baixa o estoque.
    pub quantity: Decimal,
    pub reason: StockReason,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Quantidade a movimentar por SKU, agregada a partir dos itens de um pedido.
#[derive(Debug, Clone, FromRow)]
pub struct SkuQuantity {
    pub sku_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub category: String,
    pub products: Vec<Product>,
}

/// Agrupa produtos (já ordenados por categoria) preservando a ordem.
pub fn group_by_category(products: Vec<Product>) -> Vec<ProductCategory> {
    let mut groups: Vec<ProductCategory> = Vec::new();
    for product in products {
        match groups.last_mut() {
            Some(group) if group.category == product.category => group.products.push(product),
            _ => groups.push(ProductCategory {
                category: product.category.clone(),
                products: vec![product],
            }),
        }
    }
    groups
}

// --- Listagem paginada ---

const SORTABLE_COLUMNS: [&str; 5] = ["id", "name", "quantity", "cost_price", "created_at"];

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    pub page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
    /// Filtro por nome (contém, sem diferenciar maiúsculas).
    pub name: Option<String>,
    pub sort_id: Option<String>,
    pub sort_order: Option<String>,
}

/// Parâmetros já saneados: a coluna de ordenação vem de uma lista fixa,
/// então pode ser interpolada no SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockListing {
    pub limit: i64,
    pub offset: i64,
    pub name_pattern: Option<String>,
    pub sort_column: &'static str,
    pub descending: bool,
}

impl StockQuery {
    pub fn normalize(&self) -> StockListing {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.page_size.unwrap_or(10).clamp(1, 100);

        let sort_column = self
            .sort_id
            .as_deref()
            .and_then(|wanted| SORTABLE_COLUMNS.iter().copied().find(|c| *c == wanted))
            .unwrap_or("name");

        let descending = self
            .sort_order
            .as_deref()
            .is_some_and(|o| o.eq_ignore_ascii_case("desc"));

        let name_pattern = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| format!("%{}%", escape_like(n)));

        StockListing {
            limit,
            offset: (page - 1).saturating_mul(limit),
            name_pattern,
            sort_column,
            descending,
        }
    }
}

fn escape_like(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub count: i64,
}

// --- Payloads ---

fn validate_non_zero(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("A quantidade não pode ser zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustPayload {
    /// Positivo soma, negativo baixa.
    #[validate(custom(function = "validate_non_zero"))]
    #[schema(example = "-3")]
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSkuPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub cost_price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub sku_id: Option<Uuid>,
    #[serde(default = "default_category")]
    pub category: String,
    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,
    pub image_id: Option<Uuid>,
}

fn default_category() -> String {
    "Geral".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_query_is_empty() {
        let listing = StockQuery::default().normalize();
        assert_eq!(
            listing,
            StockListing {
                limit: 10,
                offset: 0,
                name_pattern: None,
                sort_column: "name",
                descending: false,
            }
        );
    }

    #[test]
    fn page_size_is_capped_and_offset_follows_page() {
        let query = StockQuery {
            page: Some(3),
            page_size: Some(1000),
            ..Default::default()
        };
        let listing = query.normalize();
        assert_eq!(listing.limit, 100);
        assert_eq!(listing.offset, 200);
    }

    #[test]
    fn huge_page_saturates_offset() {
        let query = StockQuery {
            page: Some(i64::MAX),
            page_size: Some(100),
            ..Default::default()
        };
        let listing = query.normalize();
        assert_eq!(listing.offset, i64::MAX);
        assert_eq!(listing.limit, 100);
    }

    #[test]
    fn non_positive_page_is_first_page() {
        let query = StockQuery {
            page: Some(i64::MIN),
            ..Default::default()
        };
        assert_eq!(query.normalize().offset, 0);
    }

    #[test]
    fn unknown_sort_column_falls_back_to_name() {
        let query = StockQuery {
            sort_id: Some("quantity; DROP TABLE skus".into()),
            sort_order: Some("DESC".into()),
            ..Default::default()
        };
        let listing = query.normalize();
        assert_eq!(listing.sort_column, "name");
        assert!(listing.descending);
    }

    #[test]
    fn whitelisted_sort_column_is_kept() {
        let query = StockQuery {
            sort_id: Some("cost_price".into()),
            ..Default::default()
        };
        assert_eq!(query.normalize().sort_column, "cost_price");
    }

    #[test]
    fn name_filter_escapes_wildcards() {
        let query = StockQuery {
            name: Some(" 100% suco ".into()),
            ..Default::default()
        };
        assert_eq!(query.normalize().name_pattern.as_deref(), Some("%100\\% suco%"));
    }

    #[test]
    fn page_size_param_uses_camel_case() {
        let query: StockQuery =
            serde_json::from_value(serde_json::json!({ "page": 2, "pageSize": 5 })).unwrap();
        assert_eq!(query.normalize().offset, 5);
    }

    #[test]
    fn grouping_keeps_category_order() {
        let product = |name: &str, category: &str| Product {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            sku_id: None,
            name: name.into(),
            category: category.into(),
            price: Decimal::ONE,
            image_id: None,
            created_at: Utc::now(),
        };
        let groups = group_by_category(vec![
            product("Coca", "Bebidas"),
            product("Guaraná", "Bebidas"),
            product("Gelo", "Diversos"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].products.len(), 2);
        assert_eq!(groups[1].category, "Diversos");
    }

    #[test]
    fn zero_adjustment_is_invalid() {
        let payload = StockAdjustPayload { quantity: Decimal::ZERO };
        assert!(payload.validate().is_err());
    }
}
