//! In-memory harness shared by the handler tests.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use vehiclehub_app::clock::Clock;
use vehiclehub_app::event_bus::InProcessEventBus;
use vehiclehub_app::ports::{
    FrameSource, SerialLink, SerialPortOpener, SettingsDocument, SettingsPersistence,
};
use vehiclehub_app::serial::{DeviceRuntime, DrainOrder, SerialQueue};
use vehiclehub_app::stores::{SessionStore, SettingsStore};
use vehiclehub_domain::error::HubError;

use crate::router;
use crate::state::AppState;

#[derive(Default)]
pub struct MemoryPersistence {
    document: Mutex<SettingsDocument>,
    fail: bool,
}

impl SettingsPersistence for MemoryPersistence {
    fn load(&self) -> Result<SettingsDocument, HubError> {
        Ok(self.document.lock().clone())
    }

    fn save(&self, document: &SettingsDocument) -> Result<(), HubError> {
        if self.fail {
            return Err(HubError::storage("read-only filesystem"));
        }
        *self.document.lock() = document.clone();
        Ok(())
    }
}

struct WireLink(Arc<Mutex<Vec<String>>>);
struct IdleSource;

impl SerialLink for WireLink {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.0.lock().push(line.to_string());
        Ok(())
    }
}

impl FrameSource for IdleSource {
    fn read_frame(&mut self) -> io::Result<Option<String>> {
        std::thread::sleep(Duration::from_millis(5));
        Ok(None)
    }
}

struct WireOpener(Arc<Mutex<Vec<String>>>);

impl SerialPortOpener for WireOpener {
    type Link = WireLink;
    type Source = IdleSource;

    fn name(&self) -> &str {
        "/dev/ttyTEST"
    }

    fn open(&self) -> io::Result<(WireLink, IdleSource)> {
        Ok((WireLink(Arc::clone(&self.0)), IdleSource))
    }
}

pub struct TestApp {
    router: Router,
    pub state: AppState<(), Arc<MemoryPersistence>>,
    persistence: Arc<MemoryPersistence>,
    wire: Arc<Mutex<Vec<String>>>,
    cancel: CancellationToken,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(MemoryPersistence::default())
    }

    pub fn failing_persistence() -> Self {
        Self::build(MemoryPersistence {
            fail: true,
            ..MemoryPersistence::default()
        })
    }

    /// An app whose default serial device records every written line.
    pub fn with_device() -> Self {
        let app = Self::new();
        DeviceRuntime::new(
            WireOpener(Arc::clone(&app.wire)),
            Arc::clone(&app.state.session),
            Arc::clone(&app.state.serial),
            true,
            Duration::from_millis(10),
            app.cancel.clone(),
        )
        .spawn();
        app
    }

    fn build(persistence: MemoryPersistence) -> Self {
        let persistence = Arc::new(persistence);
        let events = Arc::new(InProcessEventBus::new(64));
        let clock = Arc::new(Clock::default());
        let session = Arc::new(SessionStore::new((), Arc::clone(&events), Arc::clone(&clock), 8));
        let settings = Arc::new(SettingsStore::new(
            Arc::clone(&persistence),
            Arc::clone(&events),
            clock,
            8,
        ));
        let serial = Arc::new(SerialQueue::new(
            DrainOrder::Fifo,
            Duration::from_millis(500),
        ));
        let state = AppState::new(session, settings, serial, events);
        Self {
            router: router::build(state.clone()),
            state,
            persistence,
            wire: Arc::new(Mutex::new(Vec::new())),
            cancel: CancellationToken::new(),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub fn persisted(&self) -> SettingsDocument {
        self.persistence.document.lock().clone()
    }

    pub fn written(&self) -> Vec<String> {
        self.wire.lock().clone()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
