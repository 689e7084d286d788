//! Sanitize-then-validate pipeline for inbound payment requests.
//!
//! Each field is first sanitized, then checked against its format rule. All
//! failures are collected so the caller can report every problem at once.

use super::money::Amount;
use super::request::{PaymentRequest, ValidatedPayment};
use super::transaction::{Currency, Provider};
use crate::config::PaymentConfig;
use crate::error::{FieldError, PaymentError, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

pub const RECIPIENT_NAME_LEN: (usize, usize) = (3, 50);
pub const ACCOUNT_NUMBER_LEN: (usize, usize) = (8, 20);
pub const SWIFT_CODE_LEN: (usize, usize) = (8, 11);
pub const SWIFT_BANK_PREFIX_LEN: usize = 6;
pub const BANK_NAME_LEN: (usize, usize) = (3, 100);
pub const BANK_ADDRESS_MAX_LEN: usize = 500;
pub const PURPOSE_MAX_LEN: usize = 100;
pub const REFERENCE_MAX_LEN: usize = 50;
pub const REASON_MAX_LEN: usize = 500;

type FieldResult<T> = std::result::Result<T, FieldError>;

/// Removes control characters and `<...>` tags from `value`.
pub fn strip_markup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch.is_control() {
            continue;
        }
        if ch == '<' && starts_tag(&value[idx + 1..]) {
            // Skip through the closing bracket of the tag.
            for (_, inner) in chars.by_ref() {
                if inner == '>' {
                    break;
                }
            }
            continue;
        }
        out.push(ch);
    }
    out
}

// An unterminated tag still counts; it is stripped to the end of the input.
fn starts_tag(rest: &str) -> bool {
    rest.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

/// Trims `raw` and rejects it if stripping control characters or markup would
/// change it any further.
pub fn sanitize(field: &'static str, raw: &str) -> FieldResult<String> {
    let trimmed = raw.trim();
    if strip_markup(trimmed) != trimmed {
        return Err(FieldError::new(
            field,
            "must not contain control characters or markup",
        ));
    }
    Ok(trimmed.to_string())
}

fn sanitize_optional(field: &'static str, raw: Option<&str>) -> FieldResult<Option<String>> {
    match raw {
        None => Ok(None),
        Some(value) => {
            let clean = sanitize(field, value)?;
            Ok((!clean.is_empty()).then_some(clean))
        }
    }
}

fn check_len(field: &'static str, value: &str, (min, max): (usize, usize)) -> FieldResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(FieldError::new(
            field,
            format!("must be {} to {} characters", min, max),
        ));
    }
    Ok(())
}

fn check_max_len(field: &'static str, value: &str, max: usize) -> FieldResult<()> {
    if value.chars().count() > max {
        return Err(FieldError::new(
            field,
            format!("must be at most {} characters", max),
        ));
    }
    Ok(())
}

fn is_letters_and_spaces(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}

fn is_alphanumeric(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_alphanumeric())
}

/// `^\d+(\.\d{1,2})?$`
fn is_amount_format(value: &str) -> bool {
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    digits(whole) && fraction.is_none_or(|f| f.len() <= 2 && digits(f))
}

pub fn validate_amount(raw: &str, config: &PaymentConfig) -> FieldResult<Amount> {
    let value = sanitize("amount", raw)?;
    if !is_amount_format(&value) {
        return Err(FieldError::new(
            "amount",
            "must be a number with at most 2 decimal places",
        ));
    }

    let number = Decimal::from_str(&value)
        .map_err(|_| FieldError::new("amount", "must be a valid number"))?;
    if number < config.min_amount {
        return Err(FieldError::new(
            "amount",
            format!("must be at least {}", config.min_amount),
        ));
    }
    if number > config.max_amount {
        return Err(FieldError::new(
            "amount",
            format!("must be at most {}", config.max_amount),
        ));
    }

    Amount::new(number).map_err(|e| match e.field_errors().first() {
        Some(field_error) => field_error.clone(),
        None => FieldError::new("amount", e.to_string()),
    })
}

pub fn validate_currency(raw: &str, config: &PaymentConfig) -> FieldResult<Currency> {
    let value = sanitize("currency", raw)?;
    Currency::from_str(&value)
        .ok()
        .filter(|c| config.supported_currencies.contains(c))
        .ok_or_else(|| {
            let codes: Vec<&str> = config.supported_currencies.iter().map(Currency::code).collect();
            FieldError::new("currency", format!("must be one of: {}", codes.join(", ")))
        })
}

pub fn validate_provider(raw: Option<&str>, config: &PaymentConfig) -> FieldResult<Provider> {
    let Some(value) = sanitize_optional("provider", raw)? else {
        return Ok(Provider::default());
    };
    Provider::from_str(&value)
        .ok()
        .filter(|p| config.supported_providers.contains(p))
        .ok_or_else(|| {
            let codes: Vec<&str> = config.supported_providers.iter().map(Provider::code).collect();
            FieldError::new("provider", format!("must be one of: {}", codes.join(", ")))
        })
}

fn validate_person_or_bank_name(
    field: &'static str,
    raw: &str,
    bounds: (usize, usize),
) -> FieldResult<String> {
    let value = sanitize(field, raw)?;
    check_len(field, &value, bounds)?;
    if !is_letters_and_spaces(&value) {
        return Err(FieldError::new(
            field,
            "must contain only letters and spaces",
        ));
    }
    Ok(value)
}

pub fn validate_recipient_name(raw: &str) -> FieldResult<String> {
    validate_person_or_bank_name("recipientName", raw, RECIPIENT_NAME_LEN)
}

pub fn validate_bank_name(raw: &str) -> FieldResult<String> {
    validate_person_or_bank_name("recipientBankName", raw, BANK_NAME_LEN)
}

pub fn validate_account_number(raw: &str) -> FieldResult<String> {
    let value = sanitize("recipientAccountNumber", raw)?;
    check_len("recipientAccountNumber", &value, ACCOUNT_NUMBER_LEN)?;
    if !is_alphanumeric(&value) {
        return Err(FieldError::new(
            "recipientAccountNumber",
            "must contain only letters and digits",
        ));
    }
    Ok(value)
}

/// Validates a BIC and returns it uppercased.
pub fn validate_swift_code(raw: &str) -> FieldResult<String> {
    let value = sanitize("swiftCode", raw)?.to_ascii_uppercase();
    check_len("swiftCode", &value, SWIFT_CODE_LEN)?;

    let well_formed = is_alphanumeric(&value)
        && value[..SWIFT_BANK_PREFIX_LEN]
            .chars()
            .all(|c| c.is_ascii_alphabetic());
    if !well_formed {
        return Err(FieldError::new(
            "swiftCode",
            "must be 6 letters followed by 2 to 5 letters or digits",
        ));
    }
    Ok(value)
}

pub fn validate_bank_address(raw: Option<&str>) -> FieldResult<Option<String>> {
    let value = sanitize_optional("recipientBankAddress", raw)?;
    if let Some(address) = &value {
        check_max_len("recipientBankAddress", address, BANK_ADDRESS_MAX_LEN)?;
    }
    Ok(value)
}

pub fn validate_purpose(raw: Option<&str>) -> FieldResult<Option<String>> {
    let value = sanitize_optional("purpose", raw)?;
    if let Some(purpose) = &value {
        check_max_len("purpose", purpose, PURPOSE_MAX_LEN)?;
        if !purpose
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ')
        {
            return Err(FieldError::new(
                "purpose",
                "must contain only letters, digits and spaces",
            ));
        }
    }
    Ok(value)
}

pub fn validate_reference(raw: Option<&str>) -> FieldResult<Option<String>> {
    let value = sanitize_optional("reference", raw)?;
    if let Some(reference) = &value {
        check_max_len("reference", reference, REFERENCE_MAX_LEN)?;
        if !is_alphanumeric(reference) {
            return Err(FieldError::new(
                "reference",
                "must contain only letters and digits",
            ));
        }
    }
    Ok(value)
}

/// Reason attached to an administrator rejection.
pub fn validate_rejection_reason(raw: &str) -> Result<String> {
    let check = || -> FieldResult<String> {
        let value = sanitize("reason", raw)?;
        if value.is_empty() {
            return Err(FieldError::new("reason", "must not be empty"));
        }
        check_max_len("reason", &value, REASON_MAX_LEN)?;
        Ok(value)
    };
    check().map_err(|e| PaymentError::ValidationFailed { fields: vec![e] })
}

fn collect<T>(errors: &mut Vec<FieldError>, result: FieldResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

/// Runs every field rule and returns either the typed payment or all
/// violations found.
pub fn validate_payment(request: &PaymentRequest, config: &PaymentConfig) -> Result<ValidatedPayment> {
    let mut errors = Vec::new();

    let amount = collect(&mut errors, validate_amount(&request.amount, config));
    let currency = collect(&mut errors, validate_currency(&request.currency, config));
    let provider = collect(
        &mut errors,
        validate_provider(request.provider.as_deref(), config),
    );
    let recipient_name = collect(&mut errors, validate_recipient_name(&request.recipient_name));
    let account_number = collect(
        &mut errors,
        validate_account_number(&request.recipient_account_number),
    );
    let swift_code = collect(&mut errors, validate_swift_code(&request.swift_code));
    let bank_name = collect(&mut errors, validate_bank_name(&request.recipient_bank_name));
    let bank_address = collect(
        &mut errors,
        validate_bank_address(request.recipient_bank_address.as_deref()),
    );
    let purpose = collect(&mut errors, validate_purpose(request.purpose.as_deref()));
    let reference = collect(&mut errors, validate_reference(request.reference.as_deref()));

    let (
        Some(amount),
        Some(currency),
        Some(provider),
        Some(recipient_name),
        Some(recipient_account_number),
        Some(swift_code),
        Some(recipient_bank_name),
        Some(recipient_bank_address),
        Some(purpose),
        Some(reference),
    ) = (
        amount,
        currency,
        provider,
        recipient_name,
        account_number,
        swift_code,
        bank_name,
        bank_address,
        purpose,
        reference,
    )
    else {
        return Err(PaymentError::ValidationFailed { fields: errors });
    };

    Ok(ValidatedPayment {
        amount,
        currency,
        provider,
        recipient_name,
        recipient_account_number,
        swift_code,
        recipient_bank_name,
        recipient_bank_address,
        purpose,
        reference,
    })
}
