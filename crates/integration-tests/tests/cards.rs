//! Integration tests for saved payment cards.
//!
//! Run with: cargo test -p cake-shop-integration-tests --test cards

use cake_shop_client::ApiError;
use cake_shop_core::CardId;
use cake_shop_core::card::{CardField, CardForm, CardNetwork};
use cake_shop_integration_tests::{MockBackend, USER_EMAIL};
use secrecy::SecretString;

fn valid_form() -> CardForm {
    CardForm {
        card_number: "4539 1488 0343 6467".to_string(),
        card_holder_name: "  Jane Baker ".to_string(),
        expiry_date: "12/27".to_string(),
        cvv: SecretString::from("123"),
        is_default: false,
    }
}

// ============================================================================
// Validation before submission
// ============================================================================

#[tokio::test]
async fn test_invalid_form_never_reaches_backend() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let session = backend.login(&client, USER_EMAIL).await;

    let form = CardForm {
        card_number: "4539 1488".to_string(),
        card_holder_name: "   ".to_string(),
        expiry_date: "13/27".to_string(),
        cvv: SecretString::from("12"),
        is_default: false,
    };
    let err = client
        .add_card(&session, &form)
        .await
        .expect_err("Invalid form should be rejected");

    let ApiError::InvalidCard(errors) = &err else {
        panic!("Expected InvalidCard, got {err:?}");
    };
    assert_eq!(errors.len(), 4);
    assert_eq!(
        errors.get(CardField::CardNumber),
        Some("Card number must be 16 digits")
    );
    assert_eq!(
        errors.get(CardField::ExpiryDate),
        Some("Expiry date must be in MM/YY format")
    );
    assert_eq!(errors.get(CardField::Cvv), Some("CVV must be 3 digits"));
    assert_eq!(
        errors.get(CardField::CardHolderName),
        Some("Cardholder name is required")
    );
    assert!(err.user_message().contains("CVV must be 3 digits"));

    assert_eq!(backend.count("POST", "/credit-cards"), 0);
    assert!(backend.card_bodies().is_empty());
}

#[tokio::test]
async fn test_update_with_invalid_form_sends_nothing() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let session = backend.login(&client, USER_EMAIL).await;

    let form = CardForm {
        cvv: SecretString::from("1234"),
        ..valid_form()
    };
    let err = client
        .update_card(&session, &CardId::new("card1"), &form)
        .await
        .expect_err("Invalid form should be rejected");
    assert!(matches!(err, ApiError::InvalidCard(_)));
    assert_eq!(backend.count("PUT", "/credit-cards/card1"), 0);
}

// ============================================================================
// Card management
// ============================================================================

#[tokio::test]
async fn test_add_card_sends_payload_without_cvv() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let session = backend.login(&client, USER_EMAIL).await;

    client
        .add_card(&session, &valid_form())
        .await
        .expect("Failed to add card");

    let bodies = backend.card_bodies();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["cardNumber"], "4539148803436467");
    assert_eq!(body["cardHolderName"], "Jane Baker");
    assert_eq!(body["expiryDate"], "12/27");
    assert_eq!(body["isDefault"], false);
    assert!(body.get("cvv").is_none());

    let cards = client.list_cards(&session).await.expect("Failed to list cards");
    assert_eq!(cards.len(), 2);
    let added = cards
        .iter()
        .find(|card| card.card_number == "4539148803436467")
        .expect("New card not listed");
    assert_eq!(added.network(), CardNetwork::Visa);
    assert_eq!(added.masked_number(), "•••• •••• •••• 6467");
    assert!(!added.is_default);
}

#[tokio::test]
async fn test_list_cards_reads_seeded_card() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let session = backend.login(&client, USER_EMAIL).await;

    let cards = client.list_cards(&session).await.expect("Failed to list cards");
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].id, CardId::new("card1"));
    assert_eq!(cards[0].network(), CardNetwork::Mastercard);
    assert!(cards[0].is_default);
}

#[tokio::test]
async fn test_set_default_card_moves_default() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let session = backend.login(&client, USER_EMAIL).await;

    client
        .add_card(&session, &valid_form())
        .await
        .expect("Failed to add card");
    let new_id = client
        .list_cards(&session)
        .await
        .expect("Failed to list cards")
        .into_iter()
        .find(|card| card.id != CardId::new("card1"))
        .expect("New card not listed")
        .id;

    client
        .set_default_card(&session, &new_id)
        .await
        .expect("Failed to set default");

    let cards = client.list_cards(&session).await.expect("Failed to list cards");
    let defaults: Vec<&CardId> = cards
        .iter()
        .filter(|card| card.is_default)
        .map(|card| &card.id)
        .collect();
    assert_eq!(defaults, vec![&new_id]);
}

#[tokio::test]
async fn test_update_card() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let session = backend.login(&client, USER_EMAIL).await;

    let form = CardForm {
        card_holder_name: "J. Baker".to_string(),
        ..valid_form()
    };
    client
        .update_card(&session, &CardId::new("card1"), &form)
        .await
        .expect("Failed to update card");

    assert_eq!(backend.count("PUT", "/credit-cards/card1"), 1);
    let cards = client.list_cards(&session).await.expect("Failed to list cards");
    assert_eq!(cards[0].card_holder_name, "J. Baker");
}

#[tokio::test]
async fn test_delete_card() {
    let backend = MockBackend::start().await;
    let client = backend.client();
    let session = backend.login(&client, USER_EMAIL).await;

    client
        .delete_card(&session, &CardId::new("card1"))
        .await
        .expect("Failed to delete card");
    let cards = client.list_cards(&session).await.expect("Failed to list cards");
    assert!(cards.is_empty());

    let err = client
        .delete_card(&session, &CardId::new("card1"))
        .await
        .expect_err("Second delete should fail");
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(), "Card not found");
}
