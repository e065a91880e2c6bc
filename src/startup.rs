use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use tracing_actix_web::TracingLogger;

use crate::backend_client::BackendClient;
use crate::configuration::Settings;
use crate::routes::chat;
use crate::routes::cleanup;
use crate::routes::health_check;
use crate::routes::home;
use crate::routes::join_waitlist;
use crate::routes::upload;
use crate::store::CsvLog;
use crate::store::RecordStore;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Bind the listener and wire up the waitlist log and backend client from
    /// `cfg`. Port 0 gets a random free port (see `get_port`).
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(addr)?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            log_path = %cfg.waitlist.log_path.display(),
            backend = %cfg.backend.base_url,
            "starting server"
        );

        let store: Arc<dyn RecordStore> = Arc::new(CsvLog::new(cfg.waitlist.log_path));
        let timeout = cfg.backend.timeout();
        let backend = BackendClient::new(cfg.backend.base_url, timeout);

        let server = run(listener, store, backend, cfg.backend.max_upload_bytes)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints.
pub fn run(
    listener: TcpListener,
    store: Arc<dyn RecordStore>,
    backend: BackendClient,
    max_upload_bytes: usize,
) -> Result<Server, anyhow::Error> {
    // `Data` is an `Arc` on the outside; every actix worker gets a clone of the
    // same store, and therefore the same lock on the waitlist log
    let store: Data<dyn RecordStore> = Data::from(store);
    let backend = Data::new(backend);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/", web::get().to(home))
            .route("/health_check", web::get().to(health_check))
            .route("/waitlist", web::post().to(join_waitlist))
            .service(
                web::scope("/api")
                    // raw upload bodies (`web::Bytes`) are capped at 256 KiB
                    // by default
                    .app_data(web::PayloadConfig::new(max_upload_bytes))
                    .route("/upload", web::post().to(upload))
                    .route("/chat", web::post().to(chat))
                    .route("/cleanup", web::post().to(cleanup)),
            )
            .app_data(store.clone())
            .app_data(backend.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
