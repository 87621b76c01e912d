use std::sync::Arc;

use imagine_gallery::{GalleryStore, ImageMaterializer};
use imagine_provider::ImageProvider;

use crate::config::ServerConfig;
use crate::engine::{JobRegistry, JobTracker, PollSettings};
use crate::ws::{BroadcastGateway, WsManager};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Jobs currently being polled.
    pub registry: Arc<JobRegistry>,
    /// WebSocket subscribers and event fan-out.
    pub gateway: Arc<BroadcastGateway>,
    /// Submission and poll loops (WebSocket mode).
    pub tracker: Arc<JobTracker>,
    /// Image provider used directly by the HTTP request/response endpoints.
    pub provider: Arc<dyn ImageProvider>,
    pub materializer: ImageMaterializer,
    pub gallery: GalleryStore,
}

impl AppState {
    /// Wire up the registry, gateway, tracker and gallery for `config`.
    pub fn new(config: ServerConfig, provider: Arc<dyn ImageProvider>) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let ws_manager = Arc::new(WsManager::new());
        let gateway = Arc::new(BroadcastGateway::new(ws_manager, Arc::clone(&registry)));

        let materializer = ImageMaterializer::new(config.output_dir.clone())
            .with_download_timeout(config.download_timeout());
        let settings = PollSettings {
            interval: config.poll_interval(),
            max_attempts: config.max_poll_attempts,
        };
        let tracker = Arc::new(JobTracker::new(
            Arc::clone(&registry),
            Arc::clone(&gateway),
            Arc::clone(&provider),
            materializer.clone(),
            settings,
        ));
        let gallery = GalleryStore::new(config.output_dir.clone());

        Self {
            config: Arc::new(config),
            registry,
            gateway,
            tracker,
            provider,
            materializer,
            gallery,
        }
    }
}
