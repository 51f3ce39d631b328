//! Product model

use serde::{Deserialize, Serialize};

/// A catalog entry. Serialized as-is for the public product list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// UUIDv4 assigned on creation
    pub id: String,
    pub name: String,
    pub description: String,
    /// Image URL or path
    pub image: String,
    pub price: f64,
    /// 0 means out of stock
    pub available: i64,
}

/// Editable fields of a product
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub price: f64,
    #[serde(default)]
    pub available: i64,
}

impl Product {
    pub fn from_input(id: String, input: ProductInput) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            image: input.image,
            price: input.price,
            available: input.available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_defaults_optional_fields() {
        let input: ProductInput =
            serde_json::from_str(r#"{"name":"Mug","price":4.5}"#).unwrap();

        assert_eq!(input.name, "Mug");
        assert_eq!(input.description, "");
        assert_eq!(input.available, 0);

        let product = Product::from_input("id-1".to_string(), input);
        assert_eq!(product.id, "id-1");
        assert_eq!(product.available, 0);
    }

    #[test]
    fn test_product_json_shape() {
        let product = Product {
            id: "p1".to_string(),
            name: "Lamp".to_string(),
            description: "Desk lamp".to_string(),
            image: "/img/lamp.png".to_string(),
            price: 19.99,
            available: 2,
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["price"], 19.99);
        assert_eq!(json["available"], 2);
    }
}
