use serde::{Deserialize, Deserializer, Serialize};

/// Identifiers issued by the storefront REST API.
///
/// The API is not consistent about id encoding: some resources use numeric
/// ids and others strings. Every id is therefore held as a string and
/// deserializes from either form.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an id from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifier of a shipping address owned by the address service.
    AddressId
}

string_id! {
    /// Identifier of a purchasable product variant.
    VariantId
}

string_id! {
    /// Identifier of an order created by the order service.
    OrderId
}

string_id! {
    /// Identifier of a payment method in the payment catalog.
    PaymentMethodId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_deserialize_from_strings_and_numbers() {
        let from_text: AddressId = serde_json::from_str("\"addr-7\"").unwrap();
        let from_number: AddressId = serde_json::from_str("42").unwrap();
        assert_eq!(from_text.as_str(), "addr-7");
        assert_eq!(from_number.as_str(), "42");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = VariantId::new("v-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"v-1\"");
    }

    #[test]
    fn id_conversions() {
        let id: OrderId = "ORD-1".into();
        assert_eq!(id.to_string(), "ORD-1");
        assert_eq!(id, OrderId::from("ORD-1".to_string()));
    }
}
