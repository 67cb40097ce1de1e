//! Login and logout.
//!
//! The password and the two-factor code are read from stdin, one per line,
//! so they never appear in shell history.

use std::io::{BufRead, Write};

use cake_shop_client::{ClientConfig, LoginOutcome, SessionStore};
use cake_shop_core::Email;
use secrecy::SecretString;
use tracing::info;

use super::{CommandError, connect};

fn prompt(label: &str) -> Result<String, CommandError> {
    eprint!("{label}: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Log in, completing two-factor verification when the backend asks for it.
pub async fn login(config: &ClientConfig, email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let (client, store) = connect(config)?;
    let password = SecretString::from(prompt("Password")?);

    let session = match client.login(&email, &password).await? {
        LoginOutcome::Authenticated(session) => session,
        LoginOutcome::TwoFactorRequired { user_id, message } => {
            client.request_two_factor_code(&user_id).await?;
            eprintln!(
                "{}",
                message.unwrap_or_else(|| "A verification code has been sent.".to_string())
            );
            let code = prompt("Verification code")?;
            client.verify_two_factor(&user_id, &code).await?
        }
    };

    store.save(&session)?;
    info!(path = %store.path().display(), "Session saved");
    println!("Logged in as {} ({})", email, session.role());
    Ok(())
}

/// Invalidate the session on the server and delete the saved copy.
///
/// The local copy is removed even when the server call fails.
pub async fn logout(config: &ClientConfig) -> Result<(), CommandError> {
    let (client, store) = connect(config)?;
    let Some(session) = store.load()? else {
        println!("Not logged in.");
        return Ok(());
    };

    let result = client.logout(&session).await;
    store.clear()?;
    result?;
    println!("Logged out.");
    Ok(())
}
