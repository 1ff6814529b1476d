//! Payment method catalog entries, selections and card details.

use common::PaymentMethodId;
use serde::{Deserialize, Serialize};

/// The kind of payment instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    Cod,
    DebitCard,
    CreditCard,
    Upi,
    Wallet,
    NetBanking,
    /// A method this client does not know how to present specially.
    #[serde(other)]
    Other,
}

impl PaymentMethodKind {
    /// Returns true if the method needs card details before it can be used.
    pub fn requires_card(&self) -> bool {
        matches!(self, PaymentMethodKind::DebitCard | PaymentMethodKind::CreditCard)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodKind::Cod => "cod",
            PaymentMethodKind::DebitCard => "debit_card",
            PaymentMethodKind::CreditCard => "credit_card",
            PaymentMethodKind::Upi => "upi",
            PaymentMethodKind::Wallet => "wallet",
            PaymentMethodKind::NetBanking => "net_banking",
            PaymentMethodKind::Other => "other",
        }
    }
}

impl std::fmt::Display for PaymentMethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry of the payment-method catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: PaymentMethodId,
    pub method: PaymentMethodKind,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "available_by_default")]
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_instruments: Option<Vec<String>>,
}

fn available_by_default() -> bool {
    true
}

impl PaymentMethod {
    /// Creates an available catalog entry.
    pub fn new(
        id: impl Into<PaymentMethodId>,
        method: PaymentMethodKind,
        name: impl Into<String>,
        icon: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            method,
            name: name.into(),
            icon: icon.into(),
            description: description.into(),
            available: true,
            supported_instruments: None,
        }
    }

    /// Returns the selection the session stores when this method is chosen.
    pub fn to_selection(&self) -> PaymentSelection {
        PaymentSelection {
            method: self.method,
            id: self.id.clone(),
            name: self.name.clone(),
            icon: self.icon.clone(),
            supported_instruments: self.supported_instruments.clone(),
        }
    }
}

/// The payment method chosen for this checkout.
///
/// Never carries card numbers or other instrument secrets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSelection {
    pub method: PaymentMethodKind,
    pub id: PaymentMethodId,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supported_instruments: Option<Vec<String>>,
}

/// Card details typed into the payment screen.
///
/// Neither `Clone` nor `Serialize`; the value lives only as long as the
/// screen that owns it.
pub struct CardDetails {
    number: String,
    expiry: String,
    cvv: String,
    holder: String,
}

impl CardDetails {
    pub fn new(
        number: impl Into<String>,
        expiry: impl Into<String>,
        cvv: impl Into<String>,
        holder: impl Into<String>,
    ) -> Self {
        Self {
            number: number.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
            holder: holder.into(),
        }
    }

    /// Returns the last four digits of the card number, if it has that many.
    pub fn last_four(&self) -> Option<String> {
        let digits = self.digits();
        (digits.len() >= 4).then(|| digits[digits.len() - 4..].to_string())
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Checks the details, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();

        let digits = self.digits();
        let only_digits_and_spaces = self
            .number
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ');
        if !only_digits_and_spaces || !(13..=19).contains(&digits.len()) {
            problems.push("Card number must be 13 to 19 digits".to_string());
        } else if !luhn_valid(&digits) {
            problems.push("Card number is invalid".to_string());
        }

        if !valid_expiry(&self.expiry) {
            problems.push("Expiry must be in MM/YY format".to_string());
        }

        if !(3..=4).contains(&self.cvv.len()) || !self.cvv.chars().all(|c| c.is_ascii_digit()) {
            problems.push("CVV must be 3 or 4 digits".to_string());
        }

        if self.holder.trim().is_empty() {
            problems.push("Cardholder name is required".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    fn digits(&self) -> String {
        self.number.chars().filter(char::is_ascii_digit).collect()
    }
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field(
                "number",
                &format!("**** {}", self.last_four().unwrap_or_default()),
            )
            .field("expiry", &self.expiry)
            .field("cvv", &"***")
            .field("holder", &self.holder)
            .finish()
    }
}

fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

fn valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    if month.len() != 2 || year.len() != 2 {
        return false;
    }
    if !year.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12))
}
