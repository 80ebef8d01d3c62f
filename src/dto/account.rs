use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    #[serde(alias = "nombre")]
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Used for both create and in-place update of an address.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub label: Option<String>,
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

impl AddressRequest {
    pub fn validate(mut self) -> Result<Self, AppError> {
        for (value, field) in [
            (&mut self.street, "street"),
            (&mut self.city, "city"),
            (&mut self.postal_code, "postalCode"),
            (&mut self.country, "country"),
        ] {
            *value = value.trim().to_string();
            if value.is_empty() {
                return Err(AppError::validation(format!("{field} is required")));
            }
        }
        self.label = trimmed(self.label);
        self.state = trimmed(self.state);
        self.phone = trimmed(self.phone);
        Ok(self)
    }
}

/// The full card number is accepted only to derive its last four digits.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodRequest {
    pub brand: String,
    pub holder_name: String,
    pub card_number: String,
    pub exp_month: i16,
    pub exp_year: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub brand: String,
    pub holder_name: String,
    pub last4: String,
    pub exp_month: i16,
    pub exp_year: i16,
}

impl PaymentMethodRequest {
    pub fn validate(self) -> Result<CardDetails, AppError> {
        let brand = self.brand.trim().to_string();
        let holder_name = self.holder_name.trim().to_string();
        if brand.is_empty() || holder_name.is_empty() {
            return Err(AppError::validation("brand and holderName are required"));
        }

        let digits: String = self
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if !(12..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::validation("cardNumber must be 12 to 19 digits"));
        }
        if !(1..=12).contains(&self.exp_month) {
            return Err(AppError::validation("expMonth must be between 1 and 12"));
        }
        if self.exp_year < 2000 {
            return Err(AppError::validation("expYear must be a four digit year"));
        }

        Ok(CardDetails {
            brand,
            holder_name,
            last4: digits[digits.len() - 4..].to_string(),
            exp_month: self.exp_month,
            exp_year: self.exp_year,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserLookupQuery {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserLookup {
    pub found: bool,
    pub name: Option<String>,
    pub email: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
