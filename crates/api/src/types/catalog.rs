//! Products, SKUs, images and categories.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tidewater_core::{CategoryId, ImageId, Price, ProductId, SkuId};

/// A category as embedded in a product (`{id, name, slug}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// A catalog category. Categories nest through `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parent: Option<Box<Category>>,
    #[serde(default)]
    pub children: Vec<Category>,
}

impl Category {
    /// Flatten a category tree depth-first, pairing each node with its depth.
    #[must_use]
    pub fn flatten(tree: &[Self]) -> Vec<(usize, &Self)> {
        fn walk<'a>(nodes: &'a [Category], depth: usize, out: &mut Vec<(usize, &'a Category)>) {
            for node in nodes {
                out.push((depth, node));
                walk(&node.children, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        walk(tree, 0, &mut out);
        out
    }

    /// Build a tree from a flat list (`/api/categories/all`) using
    /// `parent_id`. Siblings are ordered by `sort_order`, then name. A
    /// category whose parent is not in the list becomes a root.
    #[must_use]
    pub fn nest(categories: Vec<Self>) -> Vec<Self> {
        fn attach(
            parent: Option<CategoryId>,
            by_parent: &mut HashMap<Option<CategoryId>, Vec<Category>>,
        ) -> Vec<Category> {
            let mut nodes = by_parent.remove(&parent).unwrap_or_default();
            nodes.sort_by(|a, b| {
                a.sort_order
                    .cmp(&b.sort_order)
                    .then_with(|| a.name.cmp(&b.name))
            });
            for node in &mut nodes {
                node.children = attach(Some(node.id), by_parent);
            }
            nodes
        }

        let ids: HashSet<CategoryId> = categories.iter().map(|c| c.id).collect();
        let mut by_parent: HashMap<Option<CategoryId>, Vec<Self>> = HashMap::new();
        for mut category in categories {
            category.children.clear();
            let parent = category
                .parent_id
                .filter(|p| *p != category.id && ids.contains(p));
            by_parent.entry(parent).or_default().push(category);
        }

        let mut roots = attach(None, &mut by_parent);
        // Parent cycles never reach a root; list them flat at the end.
        roots.extend(by_parent.into_values().flatten());
        roots
    }
}

const fn default_true() -> bool {
    true
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ImageId,
    pub product_id: ProductId,
    pub image_path: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub is_primary: bool,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSku {
    pub id: SkuId,
    pub product_id: ProductId,
    pub sku_code: String,
    #[serde(default)]
    pub jan_code: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub other_attribute: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub cost_price: Option<Decimal>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Stock the backend says can still be sold. Displayed as-is.
    #[serde(default)]
    pub available_quantity: Option<i64>,
}

impl ProductSku {
    #[must_use]
    pub fn price(&self) -> Price {
        Price::from_amount(self.price)
    }

    /// Size / colour / other attribute joined for display, e.g. `M / Navy`.
    #[must_use]
    pub fn variant_label(&self) -> String {
        [&self.size, &self.color, &self.other_attribute]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// Whether the backend reported stock for this SKU.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.available_quantity.is_none_or(|q| q > 0)
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub product_code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub skus: Vec<ProductSku>,
}

impl Product {
    /// The primary image, else the first one.
    #[must_use]
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|img| img.is_primary)
            .or_else(|| self.images.first())
    }

    /// Lowest active SKU price, for "from ¥1,200" listings.
    #[must_use]
    pub fn min_price(&self) -> Option<Price> {
        self.skus
            .iter()
            .filter(|sku| sku.is_active)
            .map(|sku| sku.price)
            .min()
            .map(Price::from_amount)
    }

    #[must_use]
    pub fn active_skus(&self) -> Vec<&ProductSku> {
        self.skus.iter().filter(|sku| sku.is_active).collect()
    }
}

/// Sort orders accepted by `GET /api/products`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    CreatedAt,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    pub const ALL: [Self; 4] = [Self::CreatedAt, Self::PriceAsc, Self::PriceDesc, Self::Name];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Name => "name",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CreatedAt => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Name => "Name",
        }
    }
}

/// Query for product listings. Unset fields are omitted from the URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<ProductSort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Payload for creating or updating a SKU.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkuInput {
    pub sku_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jan_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_attribute: Option<String>,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Decimal>,
    pub is_active: bool,
}

/// Payload for attaching or updating an image record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageInput {
    pub image_path: String,
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    pub is_primary: bool,
}

/// Payload for creating or updating a product.
///
/// `skus` and `images` are only sent on create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductInput {
    pub category_id: Option<CategoryId>,
    pub product_code: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<Decimal>,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skus: Vec<SkuInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageInput>,
}

/// Payload for creating or updating a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    pub is_active: bool,
}

/// Result of `POST /api/upload-image`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    pub image_url: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_json() -> &'static str {
        r#"{
            "id": 5,
            "category_id": 2,
            "product_code": "TW-001",
            "name": "Linen Shirt",
            "description": null,
            "tax_rate": 10,
            "is_published": true,
            "published_at": "2026-02-01T00:00:00.000000Z",
            "sort_order": 0,
            "created_at": "2026-02-01T00:00:00.000000Z",
            "updated_at": "2026-02-01T00:00:00.000000Z",
            "category": {"id": 2, "name": "Shirts", "slug": "shirts"},
            "images": [
                {"id": 1, "product_id": 5, "image_path": "/a.jpg", "alt_text": null, "sort_order": 1, "is_primary": false},
                {"id": 2, "product_id": 5, "image_path": "/b.jpg", "alt_text": "front", "sort_order": 0, "is_primary": true}
            ],
            "skus": [
                {"id": 10, "product_id": 5, "sku_code": "TW-001-M", "size": "M", "color": "Navy", "price": "4800.00", "is_active": true, "available_quantity": 3},
                {"id": 11, "product_id": 5, "sku_code": "TW-001-L", "size": "L", "color": null, "price": 4500, "is_active": false, "available_quantity": 0}
            ]
        }"#
    }

    #[test]
    fn test_product_deserializes_backend_shape() {
        let product: Product = serde_json::from_str(product_json()).unwrap();
        assert_eq!(product.primary_image().unwrap().image_path, "/b.jpg");
        assert_eq!(product.skus.len(), 2);
        assert_eq!(product.active_skus().len(), 1);
        assert_eq!(product.min_price().unwrap().display(), "¥4,800");
    }

    #[test]
    fn test_sku_variant_label_and_stock() {
        let product: Product = serde_json::from_str(product_json()).unwrap();
        let m = &product.skus[0];
        let l = &product.skus[1];
        assert_eq!(m.variant_label(), "M / Navy");
        assert_eq!(l.variant_label(), "L");
        assert!(m.in_stock());
        assert!(!l.in_stock());
    }

    #[test]
    fn test_product_query_omits_unset_fields() {
        let query = ProductQuery {
            search: Some("linen".to_string()),
            sort_by: Some(ProductSort::PriceAsc),
            page: Some(2),
            ..ProductQuery::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"search": "linen", "sort_by": "price_asc", "page": 2})
        );
    }

    #[test]
    fn test_category_flatten() {
        let tree: Vec<Category> = serde_json::from_str(
            r#"[{"id":1,"name":"Tops","slug":"tops","children":[
                    {"id":2,"parent_id":1,"name":"Shirts","slug":"shirts"}]},
                {"id":3,"name":"Bags","slug":"bags"}]"#,
        )
        .unwrap();
        let flat: Vec<(usize, &str)> = Category::flatten(&tree)
            .into_iter()
            .map(|(depth, c)| (depth, c.name.as_str()))
            .collect();
        assert_eq!(flat, vec![(0, "Tops"), (1, "Shirts"), (0, "Bags")]);
    }

    #[test]
    fn test_category_nest() {
        let all: Vec<Category> = serde_json::from_str(
            r#"[{"id":2,"parent_id":1,"name":"Shirts","slug":"shirts","is_active":false},
                {"id":3,"name":"Bags","slug":"bags","sort_order":2},
                {"id":4,"parent_id":1,"name":"Knits","slug":"knits"},
                {"id":1,"name":"Tops","slug":"tops","sort_order":1},
                {"id":5,"parent_id":99,"name":"Orphan","slug":"orphan","sort_order":3}]"#,
        )
        .unwrap();
        let tree = Category::nest(all);
        let flat: Vec<(usize, &str)> = Category::flatten(&tree)
            .into_iter()
            .map(|(depth, c)| (depth, c.name.as_str()))
            .collect();
        assert_eq!(
            flat,
            vec![(0, "Tops"), (1, "Knits"), (1, "Shirts"), (0, "Bags"), (0, "Orphan")]
        );
    }
}
