//! In-app notifications.

use cake_shop_core::NotificationId;
use cake_shop_core::models::Notification;
use reqwest::Method;
use tracing::instrument;

use super::{Listing, segment};
use crate::client::ApiClient;
use crate::error::Result;
use crate::session::Session;

impl ApiClient {
    /// The signed-in user's notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn list_notifications(&self, session: &Session) -> Result<Vec<Notification>> {
        Ok(self
            .get::<Listing<Notification>>("notifications", Some(session))
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session), fields(notification_id = %id))]
    pub async fn mark_notification_read(
        &self,
        session: &Session,
        id: &NotificationId,
    ) -> Result<()> {
        let path = format!("notifications/{}/read", segment(id.as_str()));
        self.send_unit::<()>(Method::PUT, &path, None, Some(session))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, session))]
    pub async fn mark_all_notifications_read(&self, session: &Session) -> Result<()> {
        self.send_unit::<()>(Method::PUT, "notifications/read-all", None, Some(session))
            .await
    }
}
