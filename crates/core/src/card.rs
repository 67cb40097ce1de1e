//! Payment card input normalization and validation.
//!
//! Everything here runs on each keystroke of the add-card form, so it is pure
//! and allocation-light. The full card number and the CVV never leave the
//! form: [`CardPayload`] (the only thing sent to the backend) has no CVV
//! field, and [`CardForm`] redacts both from `Debug`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::types::CardId;

/// Display cap applied by the number input (16 digits plus 3 spaces).
pub const MAX_FORMATTED_CARD_LENGTH: usize = 19;

/// Accepted digit counts for the live Luhn check.
pub const CARD_DIGITS_RANGE: std::ops::RangeInclusive<usize> = 13..=19;

static SUBMIT_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{16}$").expect("Invalid regex"));

static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/([0-9]{2})$").expect("Invalid regex"));

static CVV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{3}$").expect("Invalid regex"));

/// Card networks the shop accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardNetwork {
    Visa,
    Mastercard,
}

impl CardNetwork {
    /// Network to draw when detection failed. Cosmetic only, not a validation pass.
    #[must_use]
    pub fn or_default_display(detected: Option<Self>) -> Self {
        detected.unwrap_or(Self::Visa)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
        }
    }
}

impl std::fmt::Display for CardNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn digits_of(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Strip non-digits and group the rest in blocks of four.
///
/// ```
/// use cake_shop_core::card::format_card_number;
///
/// assert_eq!(format_card_number("4111111111111111"), "4111 1111 1111 1111");
/// assert_eq!(format_card_number("4111-11"), "4111 11");
/// ```
#[must_use]
pub fn format_card_number(raw: &str) -> String {
    let digits = digits_of(raw);
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 4);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && i % 4 == 0 {
            formatted.push(' ');
        }
        formatted.push(digit);
    }
    formatted
}

/// Classify a card number by its leading digits.
///
/// Visa starts with `4`. Mastercard starts with `51`–`55` or `2221`–`2720`.
#[must_use]
pub fn detect_card_type(raw: &str) -> Option<CardNetwork> {
    let digits = digits_of(raw);

    if digits.starts_with('4') {
        return Some(CardNetwork::Visa);
    }

    let prefix = |len: usize| digits.get(..len).and_then(|p| p.parse::<u32>().ok());

    if prefix(2).is_some_and(|p| (51..=55).contains(&p))
        || prefix(4).is_some_and(|p| (2221..=2720).contains(&p))
    {
        return Some(CardNetwork::Mastercard);
    }

    None
}

/// Length and Luhn check used for live feedback while typing.
///
/// ```
/// use cake_shop_core::card::validate_card_number;
///
/// assert!(validate_card_number("4539 1488 0343 6467"));
/// assert!(!validate_card_number("4539148803436468"));
/// ```
#[must_use]
pub fn validate_card_number(raw: &str) -> bool {
    let digits = digits_of(raw);
    if !CARD_DIGITS_RANGE.contains(&digits.len()) {
        return false;
    }
    luhn_checksum(&digits) % 10 == 0
}

/// Luhn sum over an all-digit string.
fn luhn_checksum(digits: &str) -> u32 {
    digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, digit)| {
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum()
}

/// Strip non-digits and insert `/` after the month.
///
/// Month range is not checked here; [`CardForm::validate`] does that.
///
/// ```
/// use cake_shop_core::card::format_expiry;
///
/// assert_eq!(format_expiry("1225"), "12/25");
/// assert_eq!(format_expiry("1"), "1");
/// ```
#[must_use]
pub fn format_expiry(raw: &str) -> String {
    let digits = digits_of(raw);
    match digits.split_at_checked(2) {
        Some((month, year)) if !year.is_empty() => format!("{month}/{year}"),
        _ => digits,
    }
}

/// Form fields that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CardField {
    CardNumber,
    ExpiryDate,
    Cvv,
    CardHolderName,
}

/// Field-keyed validation messages. Every failing field is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CardFormErrors(BTreeMap<CardField, &'static str>);

impl CardFormErrors {
    #[must_use]
    pub fn get(&self, field: CardField) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CardField, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    /// All messages joined for an alert dialog.
    #[must_use]
    pub fn summary(&self) -> String {
        self.0.values().copied().collect::<Vec<_>>().join("\n")
    }

    fn insert(&mut self, field: CardField, message: &'static str) {
        self.0.insert(field, message);
    }
}

impl std::fmt::Display for CardFormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for CardFormErrors {}

/// Live feedback shown under the card number while typing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberFeedback {
    pub formatted: String,
    pub network: Option<CardNetwork>,
    pub luhn_valid: bool,
}

/// The add/edit card form as the user typed it.
#[derive(Clone)]
pub struct CardForm {
    pub card_number: String,
    pub card_holder_name: String,
    pub expiry_date: String,
    /// Write-only; checked but never sent or displayed.
    pub cvv: SecretString,
    pub is_default: bool,
}

impl std::fmt::Debug for CardForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardForm")
            .field("card_number", &"[REDACTED]")
            .field("card_holder_name", &self.card_holder_name)
            .field("expiry_date", &self.expiry_date)
            .field("cvv", &"[REDACTED]")
            .field("is_default", &self.is_default)
            .finish()
    }
}

impl Default for CardForm {
    fn default() -> Self {
        Self {
            card_number: String::new(),
            card_holder_name: String::new(),
            expiry_date: String::new(),
            cvv: SecretString::from(String::new()),
            is_default: false,
        }
    }
}

impl CardForm {
    /// Feedback for the current card number input.
    #[must_use]
    pub fn number_feedback(&self) -> NumberFeedback {
        NumberFeedback {
            formatted: format_card_number(&self.card_number),
            network: detect_card_type(&self.card_number),
            luhn_valid: validate_card_number(&self.card_number),
        }
    }

    /// Submit-time validation.
    ///
    /// Checks every field and reports all failures together. Submission
    /// requires exactly 16 digits even though [`validate_card_number`]
    /// tolerates 13 to 19.
    ///
    /// # Errors
    ///
    /// Returns the field-keyed messages when any field is invalid.
    pub fn validate(&self) -> Result<CardPayload, CardFormErrors> {
        let mut errors = CardFormErrors::default();
        let number: String = self.card_number.chars().filter(|c| *c != ' ').collect();
        let holder = self.card_holder_name.trim();

        if !SUBMIT_NUMBER_RE.is_match(&number) {
            errors.insert(CardField::CardNumber, "Card number must be 16 digits");
        }
        if !EXPIRY_RE.is_match(&self.expiry_date) {
            errors.insert(CardField::ExpiryDate, "Expiry date must be in MM/YY format");
        }
        if !CVV_RE.is_match(self.cvv.expose_secret()) {
            errors.insert(CardField::Cvv, "CVV must be 3 digits");
        }
        if holder.is_empty() {
            errors.insert(CardField::CardHolderName, "Cardholder name is required");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CardPayload {
            card_number: number,
            card_holder_name: holder.to_string(),
            expiry_date: self.expiry_date.clone(),
            is_default: self.is_default,
        })
    }
}

/// JSON body for creating or updating a card.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPayload {
    pub card_number: String,
    pub card_holder_name: String,
    pub expiry_date: String,
    pub is_default: bool,
}

impl std::fmt::Debug for CardPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardPayload")
            .field("card_number", &"[REDACTED]")
            .field("card_holder_name", &self.card_holder_name)
            .field("expiry_date", &self.expiry_date)
            .field("is_default", &self.is_default)
            .finish()
    }
}

/// A saved card as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    #[serde(alias = "_id")]
    pub id: CardId,
    pub card_number: String,
    pub card_holder_name: String,
    pub expiry_date: String,
    /// `None` when missing or a network this client does not know.
    #[serde(default, deserialize_with = "lenient_network")]
    pub card_type: Option<CardNetwork>,
    #[serde(default)]
    pub is_default: bool,
}

fn lenient_network<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<CardNetwork>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
        "visa" => Some(CardNetwork::Visa),
        "mastercard" => Some(CardNetwork::Mastercard),
        _ => None,
    }))
}

impl CardRecord {
    /// Last four digits behind bullets, e.g. `•••• •••• •••• 4242`.
    #[must_use]
    pub fn masked_number(&self) -> String {
        let digits = digits_of(&self.card_number);
        let last4 = digits.get(digits.len().saturating_sub(4)..).unwrap_or("");
        format!("•••• •••• •••• {last4}")
    }

    /// Stored network, falling back to detection on the stored number.
    #[must_use]
    pub fn network(&self) -> CardNetwork {
        CardNetwork::or_default_display(
            self.card_type
                .or_else(|| detect_card_type(&self.card_number)),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> CardForm {
        CardForm {
            card_number: "4539 1488 0343 6467".to_string(),
            card_holder_name: "  Jane Baker ".to_string(),
            expiry_date: "08/27".to_string(),
            cvv: SecretString::from("123"),
            is_default: true,
        }
    }

    #[test]
    fn test_format_card_number_groups_by_four() {
        assert_eq!(format_card_number("4111111111111111"), "4111 1111 1111 1111");
        assert_eq!(format_card_number("4111 1111 11"), "4111 1111 11");
        assert_eq!(format_card_number("41a1-1"), "4111");
        assert_eq!(format_card_number(""), "");
        assert_eq!(
            format_card_number("4111111111111111111"),
            "4111 1111 1111 1111 111"
        );
    }

    #[test]
    fn test_detect_card_type() {
        assert_eq!(detect_card_type("4111111111111111"), Some(CardNetwork::Visa));
        assert_eq!(
            detect_card_type("5500000000000004"),
            Some(CardNetwork::Mastercard)
        );
        assert_eq!(
            detect_card_type("2221000000000009"),
            Some(CardNetwork::Mastercard)
        );
        assert_eq!(
            detect_card_type("2720990000000000"),
            Some(CardNetwork::Mastercard)
        );
        assert_eq!(detect_card_type("2721000000000000"), None);
        assert_eq!(detect_card_type("5600000000000000"), None);
        assert_eq!(detect_card_type("6011000000000004"), None);
        assert_eq!(detect_card_type("5"), None);
        assert_eq!(detect_card_type(""), None);
    }

    #[test]
    fn test_default_display_network() {
        assert_eq!(CardNetwork::or_default_display(None), CardNetwork::Visa);
        assert_eq!(
            CardNetwork::or_default_display(Some(CardNetwork::Mastercard)),
            CardNetwork::Mastercard
        );
    }

    #[test]
    fn test_validate_card_number_luhn() {
        assert!(validate_card_number("4539148803436467"));
        assert!(!validate_card_number("4539148803436468"));
        assert!(validate_card_number("4111111111111111"));
        assert!(validate_card_number("5500000000000004"));
        // 15-digit Amex test number passes the live check.
        assert!(validate_card_number("378282246310005"));
    }

    #[test]
    fn test_validate_card_number_length_bounds() {
        // Luhn-valid but only 12 digits.
        assert!(!validate_card_number("000000000000"));
        assert!(validate_card_number("0000000000000"));
        assert!(validate_card_number("0000000000000000000"));
        assert!(!validate_card_number("00000000000000000000"));
    }

    #[test]
    fn test_format_expiry() {
        assert_eq!(format_expiry("1225"), "12/25");
        assert_eq!(format_expiry("1"), "1");
        assert_eq!(format_expiry("12"), "12");
        assert_eq!(format_expiry("123"), "12/3");
        assert_eq!(format_expiry("12/2"), "12/2");
        // Month range is left to submit-time validation.
        assert_eq!(format_expiry("1399"), "13/99");
    }

    #[test]
    fn test_validate_accepts_valid_form() {
        let payload = valid_form().validate().unwrap();
        assert_eq!(payload.card_number, "4539148803436467");
        assert_eq!(payload.card_holder_name, "Jane Baker");
        assert!(payload.is_default);

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("cvv").is_none());
        assert_eq!(json["cardHolderName"], "Jane Baker");
    }

    #[test]
    fn test_validate_reports_all_errors() {
        let form = CardForm {
            card_number: "4111 1111".to_string(),
            card_holder_name: "   ".to_string(),
            expiry_date: "13/25".to_string(),
            cvv: SecretString::from("12a"),
            is_default: false,
        };

        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.get(CardField::CardNumber).is_some());
        assert!(errors.get(CardField::ExpiryDate).is_some());
        assert!(errors.get(CardField::Cvv).is_some());
        assert!(errors.get(CardField::CardHolderName).is_some());
    }

    #[test]
    fn test_validate_requires_sixteen_digits_at_submit() {
        let form = CardForm {
            card_number: "378282246310005".to_string(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(CardField::CardNumber),
            Some("Card number must be 16 digits")
        );
    }

    #[test]
    fn test_number_feedback() {
        let form = CardForm {
            card_number: "5500000000000004".to_string(),
            ..CardForm::default()
        };
        let feedback = form.number_feedback();
        assert_eq!(feedback.formatted, "5500 0000 0000 0004");
        assert_eq!(feedback.network, Some(CardNetwork::Mastercard));
        assert!(feedback.luhn_valid);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", valid_form());
        assert!(!debug.contains("4539"));
        assert!(!debug.contains("123"));
        assert!(debug.contains("Jane Baker"));
    }

    #[test]
    fn test_card_record_masking_and_network() {
        let record: CardRecord = serde_json::from_value(serde_json::json!({
            "id": "card1",
            "cardNumber": "5500000000000004",
            "cardHolderName": "Jane Baker",
            "expiryDate": "08/27",
            "isDefault": false
        }))
        .unwrap();

        assert_eq!(record.masked_number(), "•••• •••• •••• 0004");
        assert_eq!(record.network(), CardNetwork::Mastercard);
    }

    #[test]
    fn test_card_record_ignores_unknown_network() {
        let record: CardRecord = serde_json::from_value(serde_json::json!({
            "_id": "card2",
            "cardNumber": "4539148803436467",
            "cardHolderName": "Jane Baker",
            "expiryDate": "01/29",
            "cardType": "Amex"
        }))
        .unwrap();

        assert_eq!(record.card_type, None);
        assert_eq!(record.network(), CardNetwork::Visa);
        assert!(!record.is_default);
    }
}
