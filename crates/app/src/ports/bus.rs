//! Outbound collaborator ports: the vehicle-bus bridge and alert delivery.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use vehiclehub_domain::error::HubError;
use vehiclehub_domain::time::Timestamp;

/// Hands named directives to the vehicle-bus bridge, which transmits them
/// eventually.
pub trait BusBridge: Send + Sync {
    /// Enqueue a directive such as `pause` or `play`.
    fn enqueue(&self, directive: &str) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: BusBridge> BusBridge for Arc<T> {
    fn enqueue(&self, directive: &str) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).enqueue(directive)
    }
}

/// An out-of-band notification for the vehicle owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub at: Timestamp,
}

/// Delivers alerts outside the serial path.
pub trait AlertSink: Send + Sync {
    /// Deliver one alert.
    fn alert(&self, alert: &Alert) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: AlertSink> AlertSink for Arc<T> {
    fn alert(&self, alert: &Alert) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).alert(alert)
    }
}

/// Drops directives and alerts; used when no bridge is configured.
impl BusBridge for () {
    async fn enqueue(&self, directive: &str) -> Result<(), HubError> {
        tracing::debug!(directive, "no bus bridge configured, dropping directive");
        Ok(())
    }
}

impl AlertSink for () {
    async fn alert(&self, alert: &Alert) -> Result<(), HubError> {
        tracing::info!(title = %alert.title, message = %alert.message, "alert (no sink configured)");
        Ok(())
    }
}

impl<T: BusBridge> BusBridge for Option<T> {
    async fn enqueue(&self, directive: &str) -> Result<(), HubError> {
        match self {
            Some(inner) => inner.enqueue(directive).await,
            None => ().enqueue(directive).await,
        }
    }
}

impl<T: AlertSink> AlertSink for Option<T> {
    async fn alert(&self, alert: &Alert) -> Result<(), HubError> {
        match self {
            Some(inner) => inner.alert(alert).await,
            None => ().alert(alert).await,
        }
    }
}
