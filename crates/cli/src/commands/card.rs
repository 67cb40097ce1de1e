//! Card number feedback and form validation.
//!
//! # Usage
//!
//! ```bash
//! cake-cli card check 5500000000000004
//! cake-cli card validate --number 4539148803436467 --name "Jane Baker" --expiry 1227 --cvv 123
//! ```

use cake_shop_core::card::{CardForm, CardNetwork, format_expiry};
use secrecy::SecretString;

use super::CommandError;

/// Print formatted number, network and Luhn result.
pub fn check(number: &str) -> Result<(), CommandError> {
    let form = CardForm {
        card_number: number.to_string(),
        ..CardForm::default()
    };
    let feedback = form.number_feedback();

    println!("Number:  {}", feedback.formatted);
    println!(
        "Network: {}",
        feedback
            .network
            .map_or("unknown", CardNetwork::as_str)
    );
    println!(
        "Luhn:    {}",
        if feedback.luhn_valid { "valid" } else { "invalid" }
    );
    Ok(())
}

/// Validate a full form, printing the payload that would be sent.
pub fn validate(
    number: String,
    name: String,
    expiry: String,
    cvv: String,
    is_default: bool,
) -> Result<(), CommandError> {
    let form = CardForm {
        card_number: number,
        card_holder_name: name,
        expiry_date: format_expiry(&expiry),
        cvv: SecretString::from(cvv),
        is_default,
    };

    match form.validate() {
        Ok(payload) => {
            println!("Card details are valid.");
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Err(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("{field:?}: {message}");
            }
            Err(CommandError::InvalidCard(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_formats_raw_expiry() {
        let result = validate(
            "4539148803436467".to_string(),
            "Jane Baker".to_string(),
            "1227".to_string(),
            "123".to_string(),
            false,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_reports_every_error() {
        let result = validate(
            "4111".to_string(),
            " ".to_string(),
            "13/27".to_string(),
            "12".to_string(),
            false,
        );
        match result {
            Err(CommandError::InvalidCard(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected card errors, got {other:?}"),
        }
    }
}
