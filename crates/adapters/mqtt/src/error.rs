//! MQTT adapter error types.

use std::time::Duration;

use vehiclehub_domain::error::HubError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The broker connection did not come up in time.
    #[error("MQTT client not connected after {0:?}")]
    NotConnected(Duration),

    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// Failed to encode an outgoing payload as JSON.
    #[error("failed to encode MQTT payload")]
    PayloadEncode(#[source] serde_json::Error),
}

impl From<MqttError> for HubError {
    fn from(err: MqttError) -> Self {
        HubError::device(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_connected_error() {
        let err = MqttError::NotConnected(Duration::from_secs(2));
        assert_eq!(err.to_string(), "MQTT client not connected after 2s");
    }

    #[test]
    fn should_convert_into_device_error() {
        let err: HubError = MqttError::NotConnected(Duration::ZERO).into();
        assert!(matches!(err, HubError::Device(_)));
    }

    #[test]
    fn should_display_payload_encode_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err = MqttError::PayloadEncode(json_err);
        assert_eq!(err.to_string(), "failed to encode MQTT payload");
    }
}
