//! Create/edit form for a single wire.

use std::str::FromStr;

use rust_decimal::Decimal;
use wiredesk_shared::{
    validate_wire_fields, ApiError, FieldError, Wire, WireCreate, WireStatus, WireUpdate,
};

use crate::api_client::ApiClient;
use crate::routes::{Navigator, Route};
use crate::stores::{QueryCache, QueryKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: i64 },
}

impl FormMode {
    pub fn from_route(route: &Route) -> Option<Self> {
        match route {
            Route::NewWire => Some(FormMode::Create),
            Route::EditWire { id } => Some(FormMode::Edit { id: *id }),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FormMode::Create => "New Wire",
            FormMode::Edit { .. } => "Edit Wire",
        }
    }
}

/// Raw field values as typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct WireForm {
    pub sender_name: String,
    pub recipient_name: String,
    pub amount: String,
    pub currency: String,
    /// Only sent when editing.
    pub status: WireStatus,
}

impl Default for WireForm {
    fn default() -> Self {
        Self {
            sender_name: String::new(),
            recipient_name: String::new(),
            amount: "0".to_string(),
            currency: "USD".to_string(),
            status: WireStatus::Pending,
        }
    }
}

impl From<&Wire> for WireForm {
    fn from(wire: &Wire) -> Self {
        Self {
            sender_name: wire.sender_name.clone(),
            recipient_name: wire.recipient_name.clone(),
            amount: wire.amount.to_string(),
            currency: wire.currency.clone(),
            status: wire.status,
        }
    }
}

/// Values that passed validation.
struct ValidForm {
    sender_name: String,
    recipient_name: String,
    amount: Decimal,
    currency: String,
}

impl WireForm {
    /// Check every field; all failures are reported together.
    pub fn validate(&self) -> Vec<FieldError> {
        match self.parse() {
            Ok(_) => Vec::new(),
            Err(errors) => errors,
        }
    }

    fn parse(&self) -> Result<ValidForm, Vec<FieldError>> {
        let amount = Decimal::from_str(self.amount.trim());
        let mut errors = validate_wire_fields(
            &self.sender_name,
            &self.recipient_name,
            amount.as_ref().unwrap_or(&Decimal::ONE),
            &self.currency,
        );
        let amount = match amount {
            Ok(amount) => amount,
            Err(_) => {
                let at = errors
                    .iter()
                    .position(|e| e.field == "currency")
                    .unwrap_or(errors.len());
                errors.insert(
                    at,
                    FieldError {
                        field: "amount",
                        message: "Amount must be a number".to_string(),
                    },
                );
                Decimal::ZERO
            }
        };
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ValidForm {
            sender_name: self.sender_name.clone(),
            recipient_name: self.recipient_name.clone(),
            amount,
            currency: self.currency.clone(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("{} field(s) are invalid", .0.len())]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl FormError {
    /// Message for `field`, if validation rejected it.
    pub fn field_message(&self, field: &str) -> Option<&str> {
        match self {
            FormError::Validation(errors) => errors
                .iter()
                .find(|e| e.field == field)
                .map(|e| e.message.as_str()),
            FormError::Api(_) => None,
        }
    }
}

pub struct WireFormController {
    api: ApiClient,
    cache: QueryCache,
    navigator: Navigator,
    mode: FormMode,
}

impl WireFormController {
    pub fn new(api: ApiClient, cache: QueryCache, navigator: Navigator, mode: FormMode) -> Self {
        Self {
            api,
            cache,
            navigator,
            mode,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Initial field values: blank for a new wire, the stored record when editing.
    pub async fn load(&self) -> Result<WireForm, ApiError> {
        match self.mode {
            FormMode::Create => Ok(WireForm::default()),
            FormMode::Edit { id } => {
                let api = self.api.clone();
                let wire: Wire = self
                    .cache
                    .fetch(&QueryKey::wire(id), move || async move { api.get_wire(id).await })
                    .await?;
                Ok(WireForm::from(&wire))
            }
        }
    }

    /// Validate, save, refresh the affected queries and go back to the list.
    /// Nothing is sent when validation fails.
    pub async fn submit(&self, form: &WireForm) -> Result<Wire, FormError> {
        let valid = form.parse().map_err(FormError::Validation)?;

        let saved = match self.mode {
            FormMode::Create => {
                let wire = self
                    .api
                    .create_wire(&WireCreate {
                        sender_name: valid.sender_name,
                        recipient_name: valid.recipient_name,
                        amount: valid.amount,
                        currency: valid.currency,
                    })
                    .await?;
                crate::log_info!("Created wire {}", wire.id);
                self.cache.invalidate(&QueryKey::wires());
                wire
            }
            FormMode::Edit { id } => {
                let wire = self
                    .api
                    .update_wire(
                        id,
                        &WireUpdate {
                            sender_name: Some(valid.sender_name),
                            recipient_name: Some(valid.recipient_name),
                            amount: Some(valid.amount),
                            currency: Some(valid.currency),
                            status: Some(form.status),
                        },
                    )
                    .await?;
                crate::log_info!("Updated wire {}", id);
                self.cache.invalidate(&QueryKey::wires());
                self.cache.invalidate(&QueryKey::wire(id));
                wire
            }
        };

        self.navigator.navigate(Route::WireList);
        Ok(saved)
    }

    /// Leave the form without saving.
    pub fn cancel(&self) {
        self.navigator.navigate(Route::WireList);
    }
}
