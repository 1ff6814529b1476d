//! Shipping addresses.

use common::AddressId;
use serde::{Deserialize, Serialize};

/// A shipping address as returned by the address service.
///
/// The checkout session keeps a copy of the verified address; the address
/// service remains the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default)]
    pub area: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Returns the address as a single display line.
    pub fn one_line(&self) -> String {
        let mut parts: Vec<&str> = vec![self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2);
        }
        if !self.area.is_empty() {
            parts.push(&self.area);
        }
        parts.push(&self.city);
        parts.push(&self.state);
        format!("{} {}", parts.join(", "), self.pincode)
    }
}

/// A required field of the manual address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressField {
    Street,
    City,
    State,
    Zip,
}

impl AddressField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressField::Street => "street",
            AddressField::City => "city",
            AddressField::State => "state",
            AddressField::Zip => "zip",
        }
    }
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An address the customer is typing in by hand.
///
/// Serializes to the address service's create payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDraft {
    #[serde(rename = "line1")]
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(default)]
    pub area: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "pincode")]
    pub zip: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressDraft {
    /// Creates a draft with the required fields filled in.
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            state: state.into(),
            zip: zip.into(),
            ..Self::default()
        }
    }

    /// Returns the required fields that are empty or whitespace-only.
    pub fn missing_fields(&self) -> Vec<AddressField> {
        [
            (AddressField::Street, &self.street),
            (AddressField::City, &self.city),
            (AddressField::State, &self.state),
            (AddressField::Zip, &self.zip),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Returns true if every required field is filled in.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}
