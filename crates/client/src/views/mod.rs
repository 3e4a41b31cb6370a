//! Framework-agnostic view controllers. A renderer drives them and draws
//! whatever state they expose.

pub mod auth;
pub mod wire_form;
pub mod wire_list;

pub use auth::{AuthController, AuthError};
pub use wire_form::{FormError, FormMode, WireForm, WireFormController};
pub use wire_list::{status_color, Confirm, WireListView, PAGE_SIZE_OPTIONS};
