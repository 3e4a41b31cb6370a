//! Shared data models for the wire management API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Wires ---

/// Lifecycle status of a wire transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WireStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl WireStatus {
    pub const ALL: [WireStatus; 4] = [
        WireStatus::Pending,
        WireStatus::Processing,
        WireStatus::Completed,
        WireStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WireStatus::Pending => "pending",
            WireStatus::Processing => "processing",
            WireStatus::Completed => "completed",
            WireStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for WireStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WireStatus::Pending),
            "processing" => Ok(WireStatus::Processing),
            "completed" => Ok(WireStatus::Completed),
            "failed" => Ok(WireStatus::Failed),
            other => Err(format!("Invalid status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wire {
    pub id: i64,
    pub sender_name: String,
    pub recipient_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: WireStatus,
    pub reference_number: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireCreate {
    pub sender_name: String,
    pub recipient_name: String,
    pub amount: Decimal,
    pub currency: String,
}

/// Partial update. Fields left as `None` are not sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WireUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WireStatus>,
}

impl WireUpdate {
    pub fn is_empty(&self) -> bool {
        self.sender_name.is_none()
            && self.recipient_name.is_none()
            && self.amount.is_none()
            && self.currency.is_none()
            && self.status.is_none()
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Pagination and filter parameters for `GET /api/wires`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListParams {
    /// 1-indexed page number.
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WireStatus>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireListResponse {
    pub wires: Vec<Wire>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    /// Whether the server answered from its own cache. Informational only.
    #[serde(default)]
    pub cached: bool,
}

impl WireListResponse {
    /// Number of pages needed to show `total` records.
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }
}

// --- Users & auth ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

// --- Validation ---

pub const NAME_MAX_LEN: usize = 200;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 100;

/// A rule violation for a single named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_name(field: &'static str, label: &str, value: &str) -> Option<FieldError> {
    if value.trim().is_empty() {
        return Some(FieldError::new(field, format!("{label} is required")));
    }
    if value.chars().count() > NAME_MAX_LEN {
        return Some(FieldError::new(
            field,
            format!("{label} must be at most {NAME_MAX_LEN} characters"),
        ));
    }
    None
}

pub fn validate_amount(amount: &Decimal) -> Option<FieldError> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Some(FieldError::new("amount", "Amount must be positive"));
    }
    None
}

pub fn validate_currency(currency: &str) -> Option<FieldError> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Some(FieldError::new("currency", "Currency must be 3 letters"));
    }
    None
}

/// Check every field of a wire against the shared rules.
pub fn validate_wire_fields(
    sender_name: &str,
    recipient_name: &str,
    amount: &Decimal,
    currency: &str,
) -> Vec<FieldError> {
    [
        validate_name("sender_name", "Sender name", sender_name),
        validate_name("recipient_name", "Recipient name", recipient_name),
        validate_amount(amount),
        validate_currency(currency),
    ]
    .into_iter()
    .flatten()
    .collect()
}

impl WireCreate {
    pub fn validate(&self) -> Vec<FieldError> {
        validate_wire_fields(
            &self.sender_name,
            &self.recipient_name,
            &self.amount,
            &self.currency,
        )
    }
}

impl WireUpdate {
    /// Only the fields present are checked.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let Some(name) = &self.sender_name {
            errors.extend(validate_name("sender_name", "Sender name", name));
        }
        if let Some(name) = &self.recipient_name {
            errors.extend(validate_name("recipient_name", "Recipient name", name));
        }
        if let Some(amount) = &self.amount {
            errors.extend(validate_amount(amount));
        }
        if let Some(currency) = &self.currency {
            errors.extend(validate_currency(currency));
        }
        errors
    }
}

pub fn validate_password(password: &str) -> Option<FieldError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Some(FieldError::new(
            "password",
            format!("Password must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"),
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(sender: &str, recipient: &str, amount: Decimal, currency: &str) -> WireCreate {
        WireCreate {
            sender_name: sender.to_string(),
            recipient_name: recipient.to_string(),
            amount,
            currency: currency.to_string(),
        }
    }

    #[test]
    fn status_names_round_trip() {
        for status in WireStatus::ALL {
            assert_eq!(status.as_str().parse::<WireStatus>(), Ok(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("settled".parse::<WireStatus>().is_err());
    }

    #[test]
    fn valid_wire_passes() {
        let wire = create("John Doe", "Jane Smith", Decimal::new(100000, 2), "USD");
        assert!(wire.validate().is_empty());
    }

    #[test]
    fn each_rule_reports_its_field() {
        let wire = create("  ", &"x".repeat(201), Decimal::ZERO, "usd");
        let fields: Vec<_> = wire.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["sender_name", "recipient_name", "amount", "currency"]
        );

        let negative = create("a", "b", Decimal::new(-5, 0), "EURO");
        let fields: Vec<_> = negative.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["amount", "currency"]);
    }

    #[test]
    fn partial_update_checks_only_present_fields() {
        let update = WireUpdate {
            currency: Some("GB".to_string()),
            ..Default::default()
        };
        let errors = update.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Currency must be 3 letters");

        assert!(WireUpdate::default().validate().is_empty());
        assert!(WireUpdate::default().is_empty());
    }

    #[test]
    fn update_omits_absent_fields() {
        let update = WireUpdate {
            status: Some(WireStatus::Completed),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "completed" }));
    }

    #[test]
    fn list_response_accepts_numeric_amounts() {
        let body = r#"{
            "wires": [{
                "id": 1,
                "sender_name": "John Doe",
                "recipient_name": "Jane Smith",
                "amount": 1000.00,
                "currency": "USD",
                "status": "pending",
                "reference_number": "WIRE-ABC123DEF456",
                "created_by": 7,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": null
            }],
            "total": 41,
            "page": 1,
            "page_size": 20
        }"#;
        let list: WireListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(list.wires[0].amount, Decimal::new(100000, 2));
        assert!(!list.cached);
        assert_eq!(list.page_count(), 3);
    }

    #[test]
    fn password_bounds() {
        assert!(validate_password("short").is_some());
        assert!(validate_password("longenough").is_none());
        assert!(validate_password(&"p".repeat(101)).is_some());
    }
}
