//! Store statistics.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use vehiclehub_app::ports::{SettingsPersistence, StateMirror};
use vehiclehub_app::serial::DeviceSnapshot;
use vehiclehub_app::stores::StoreStats;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub session: StoreStats,
    pub settings: StoreStats,
    pub devices: Vec<DeviceSnapshot>,
}

/// `GET /stats`
pub async fn get<M, P>(State(state): State<AppState<M, P>>) -> Json<StatsResponse>
where
    M: StateMirror + 'static,
    P: SettingsPersistence + 'static,
{
    Json(StatsResponse {
        session: state.session.stats(),
        settings: state.settings.stats(),
        devices: state.serial.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::testing::{TestApp, body_json};

    #[tokio::test]
    async fn should_count_writes_per_table() {
        let app = TestApp::new();
        app.post_json("/session/rpm", json!({"value": 800})).await;
        app.post_json("/session/rpm", json!({"value": 800})).await;
        app.post("/settings/board/power/ON").await;

        let stats = body_json(app.get("/stats").await).await;

        assert_eq!(stats["session"]["entries"], 1);
        assert_eq!(stats["session"]["total_writes"], 2);
        assert_eq!(stats["settings"]["total_writes"], 1);
        assert_eq!(stats["devices"], json!([]));
    }
}
