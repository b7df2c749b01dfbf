//! Addresses, wishlists and registration data.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tidewater_core::{AddressId, AddressType, Email, ProductId, SkuId, UserId, WishlistId};

use super::{Product, ProductSku};

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    #[serde(default)]
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
    pub recipient_name: String,
    #[serde(default)]
    pub recipient_name_kana: Option<String>,
    pub postal_code: String,
    pub prefecture: String,
    pub city: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub phone: String,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Address {
    /// One-line rendering: `〒150-0001 Tokyo Shibuya 1-2-3 Jingumae`.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![
            format!("〒{}", self.postal_code),
            self.prefecture.clone(),
            self.city.clone(),
            self.address_line1.clone(),
        ];
        if let Some(line2) = self.address_line2.as_deref().filter(|s| !s.is_empty()) {
            parts.push(line2.to_string());
        }
        parts.join(" ")
    }
}

impl From<&Address> for AddressInput {
    fn from(a: &Address) -> Self {
        Self {
            recipient_name: a.recipient_name.clone(),
            recipient_name_kana: a.recipient_name_kana.clone(),
            postal_code: a.postal_code.clone(),
            prefecture: a.prefecture.clone(),
            city: a.city.clone(),
            address_line1: a.address_line1.clone(),
            address_line2: a.address_line2.clone(),
            phone: a.phone.clone(),
            address_type: a.address_type,
            is_default: a.is_default,
        }
    }
}

/// Payload for creating or updating an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub recipient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_name_kana: Option<String>,
    pub postal_code: String,
    pub prefecture: String,
    pub city: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub address_type: AddressType,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Labels of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("Recipient name", &self.recipient_name),
            ("Postal code", &self.postal_code),
            ("Prefecture", &self.prefecture),
            ("City", &self.city),
            ("Address line 1", &self.address_line1),
            ("Phone", &self.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| label)
        .collect()
    }
}

/// A wishlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    pub id: WishlistId,
    pub user_id: UserId,
    pub product_id: ProductId,
    #[serde(default)]
    pub product_sku_id: Option<SkuId>,
    #[serde(default, deserialize_with = "super::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default, alias = "productSku")]
    pub product_sku: Option<ProductSku>,
}

/// Registration form data.
///
/// The password is held as a secret and only exposed while building the
/// request body.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub name_kana: Option<String>,
    pub gender: String,
    pub birthday: String,
    pub email: Email,
    pub phone: Option<String>,
    pub password: SecretString,
    pub password_confirmation: SecretString,
}

impl Registration {
    pub(crate) fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "name_kana": self.name_kana,
            "gender": self.gender,
            "birthday": self.birthday,
            "email": self.email.as_str(),
            "phone": self.phone,
            "password": self.password.expose_secret(),
            "password_confirmation": self.password_confirmation.expose_secret(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields() {
        let input = AddressInput {
            recipient_name: "Aoi Tanaka".to_string(),
            postal_code: " ".to_string(),
            prefecture: "Tokyo".to_string(),
            city: "Shibuya".to_string(),
            ..AddressInput::default()
        };
        assert_eq!(
            input.missing_fields(),
            vec!["Postal code", "Address line 1", "Phone"]
        );
    }

    #[test]
    fn test_address_input_omits_blank_optionals() {
        let input = AddressInput {
            recipient_name: "Aoi Tanaka".to_string(),
            postal_code: "150-0001".to_string(),
            prefecture: "Tokyo".to_string(),
            city: "Shibuya".to_string(),
            address_line1: "1-2-3 Jingumae".to_string(),
            phone: "03-0000-0000".to_string(),
            ..AddressInput::default()
        };
        let value = serde_json::to_value(&input).unwrap();
        assert!(value.get("address_line2").is_none());
        assert_eq!(value["address_type"], "home");
        assert_eq!(value["is_default"], false);
    }

    #[test]
    fn test_wishlist_accepts_camel_case_sku() {
        let wishlist: Wishlist = serde_json::from_str(
            r#"{"id":1,"user_id":7,"product_id":5,"product_sku_id":10,
                "productSku":{"id":10,"product_id":5,"sku_code":"TW-001-M","price":4800}}"#,
        )
        .unwrap();
        assert_eq!(wishlist.product_sku.unwrap().sku_code, "TW-001-M");
    }

    #[test]
    fn test_address_one_line() {
        let address: Address = serde_json::from_str(
            r#"{"id":3,"user_id":7,"address_type":"office","is_default":true,
                "recipient_name":"Aoi Tanaka","postal_code":"150-0001","prefecture":"Tokyo",
                "city":"Shibuya","address_line1":"1-2-3 Jingumae","address_line2":"Room 4",
                "phone":"03-0000-0000"}"#,
        )
        .unwrap();
        assert_eq!(
            address.one_line(),
            "〒150-0001 Tokyo Shibuya 1-2-3 Jingumae Room 4"
        );
        assert_eq!(AddressInput::from(&address).address_type, AddressType::Office);
    }

    #[test]
    fn test_registration_body_exposes_password_only_in_json() {
        let reg = Registration {
            name: "Aoi".to_string(),
            name_kana: None,
            gender: "female".to_string(),
            birthday: "1990-04-01".to_string(),
            email: Email::parse("aoi@example.com").unwrap(),
            phone: None,
            password: SecretString::from("hunter22hunter"),
            password_confirmation: SecretString::from("hunter22hunter"),
        };
        assert!(!format!("{reg:?}").contains("hunter22hunter"));
        assert_eq!(reg.to_json()["password"], "hunter22hunter");
    }
}
