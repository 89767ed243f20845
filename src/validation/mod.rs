//! Validation composition
//!
//! Field-level rules are small validators that turn a cell value into a
//! deferred [`Check`]. [`run_validations`] runs a list of checks and returns
//! every failure as a [`Message`], in check order.
//!
//! Failures here are data. Nothing in this module returns an error or
//! panics on a bad cell value.

mod check;
mod message;
mod validators;

pub use check::{fail, pass, run_validations, Check};
pub use message::{Message, MessageKind, MessageStage};
pub use validators::{
    validate_email, validate_pattern, EmailValidator, FieldValidator, Pattern, PatternValidator,
    Validator, INVALID_EMAIL, INVALID_FORMAT, INVALID_OPTION,
};
