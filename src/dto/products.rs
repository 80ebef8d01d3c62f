use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, models::Product};

/// A list field sent either as a JSON array or as comma-separated text.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ListInput {
    Text(String),
    Items(Vec<String>),
}

impl ListInput {
    /// Trimmed, non-empty tokens in their original order.
    pub fn normalize(self) -> Vec<String> {
        let tokens: Vec<String> = match self {
            ListInput::Text(text) => text.split(',').map(str::to_string).collect(),
            ListInput::Items(items) => items,
        };
        tokens
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub images: Option<ListInput>,
    pub highlights: Option<ListInput>,
    pub discount: Option<i16>,
    pub barcode: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub category: String,
    pub images: Vec<String>,
    pub highlights: Vec<String>,
    pub discount: i16,
    pub barcode: Option<String>,
}

impl CreateProductRequest {
    pub fn validate(self) -> Result<NewProduct, AppError> {
        let name = required_text(self.name, "name")?;
        let category = required_text(self.category, "category")?;
        let price = self
            .price
            .ok_or_else(|| AppError::validation("price is required"))?;
        validate_price(price)?;
        let discount = self.discount.unwrap_or(0);
        validate_discount(discount)?;

        Ok(NewProduct {
            name,
            description: optional_text(self.description),
            price,
            category,
            images: self.images.map(ListInput::normalize).unwrap_or_default(),
            highlights: self.highlights.map(ListInput::normalize).unwrap_or_default(),
            discount,
            barcode: optional_text(self.barcode),
        })
    }
}

/// Partial update. Availability is deliberately absent: it only moves through
/// order and return flows.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub images: Option<ListInput>,
    pub highlights: Option<ListInput>,
    pub discount: Option<i16>,
    /// An empty string clears the barcode.
    pub barcode: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub images: Option<Vec<String>>,
    pub highlights: Option<Vec<String>>,
    pub discount: Option<i16>,
    pub barcode: Option<Option<String>>,
}

impl UpdateProductRequest {
    pub fn validate(self) -> Result<ProductChanges, AppError> {
        let name = self
            .name
            .map(|n| required_text(Some(n), "name"))
            .transpose()?;
        let category = self
            .category
            .map(|c| required_text(Some(c), "category"))
            .transpose()?;
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(discount) = self.discount {
            validate_discount(discount)?;
        }

        Ok(ProductChanges {
            name,
            description: self.description.map(|d| optional_text(Some(d))),
            price: self.price,
            category,
            images: self.images.map(ListInput::normalize),
            highlights: self.highlights.map(ListInput::normalize),
            discount: self.discount,
            barcode: self.barcode.map(|b| optional_text(Some(b))),
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveImageRequest {
    pub image_path: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
    pub total: u64,
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("{field} is required")))
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_price(price: i64) -> Result<(), AppError> {
    if price < 0 {
        return Err(AppError::validation("price must not be negative"));
    }
    Ok(())
}

fn validate_discount(discount: i16) -> Result<(), AppError> {
    if !(0..=100).contains(&discount) {
        return Err(AppError::validation("discount must be between 0 and 100"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(value: serde_json::Value) -> CreateProductRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn comma_separated_lists_are_split_trimmed_and_compacted() {
        let list = ListInput::Text(" a.jpg, ,b.jpg ,,c.jpg ".into());
        assert_eq!(list.normalize(), vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn array_lists_drop_blank_entries() {
        let list = ListInput::Items(vec!["  first ".into(), "".into(), "second".into()]);
        assert_eq!(list.normalize(), vec!["first", "second"]);
    }

    #[test]
    fn create_accepts_text_or_array_lists() {
        let product = create(json!({
            "name": "Cap",
            "price": 200,
            "category": "Hats",
            "images": "front.jpg, back.jpg",
            "highlights": ["Wool", " Vintage "]
        }))
        .validate()
        .unwrap();

        assert_eq!(product.images, vec!["front.jpg", "back.jpg"]);
        assert_eq!(product.highlights, vec!["Wool", "Vintage"]);
        assert_eq!(product.discount, 0);
        assert_eq!(product.barcode, None);
    }

    #[test]
    fn create_requires_name_price_and_category() {
        for (payload, field) in [
            (json!({"price": 1, "category": "Hats"}), "name"),
            (json!({"name": "Cap", "category": "Hats"}), "price"),
            (json!({"name": "Cap", "price": 1}), "category"),
            (json!({"name": "   ", "price": 1, "category": "Hats"}), "name"),
        ] {
            let err = create(payload).validate().unwrap_err();
            match err {
                AppError::Validation(msg) => assert!(msg.contains(field), "{msg}"),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn create_rejects_negative_price_and_out_of_range_discount() {
        assert!(
            create(json!({"name": "Cap", "price": -1, "category": "Hats"}))
                .validate()
                .is_err()
        );
        assert!(
            create(json!({"name": "Cap", "price": 1, "category": "Hats", "discount": 101}))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn update_distinguishes_absent_from_cleared_fields() {
        let changes = UpdateProductRequest {
            barcode: Some("".into()),
            images: Some(ListInput::Text("x.jpg".into())),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(changes.barcode, Some(None));
        assert_eq!(changes.images, Some(vec!["x.jpg".to_string()]));
        assert_eq!(changes.description, None);
        assert_eq!(changes.name, None);
    }

    #[test]
    fn update_rejects_blank_name() {
        let err = UpdateProductRequest {
            name: Some(" ".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
