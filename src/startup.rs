use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::{header, Method};
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::configuration::{ApplicationSettings, Settings};
use crate::database::get_connection_pool;
use crate::identity_client::{IdentityProvider, IdentityToolkitClient};
use crate::routes::auth::challenge::{ChallengeIssuer, RecaptchaChallengeIssuer};
use crate::routes::auth::resolver::{AuthorizationResolver, ProfileStore};
use crate::routes::auth::session::SessionHub;
use crate::routes::auth::utils::PgProfileStore;
use crate::routes::main_route;
use crate::routes::media::UploadTracker;
use crate::storage_client::{FirebaseStorageClient, MediaStore};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database);
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        tracing::info!("Listening on {}:{}", configuration.application.host, port);
        let server = run(listener, connection_pool, configuration).await?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Only returns once the server stops.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn cors(application: &ApplicationSettings) -> Cors {
    let cors = application
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin));
    cors.allowed_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .supports_credentials()
        .max_age(3600)
}

fn spawn_session_pruner(hub: web::Data<SessionHub>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            hub.prune();
        }
    });
}

async fn run(
    listener: TcpListener,
    db_pool: PgPool,
    configuration: Settings,
) -> Result<Server, anyhow::Error> {
    let profile_store: Arc<dyn ProfileStore> = Arc::new(PgProfileStore::new(db_pool.clone()));
    let identity_provider: Arc<dyn IdentityProvider> =
        Arc::new(IdentityToolkitClient::from_settings(&configuration.identity)?);
    let media_store: Arc<dyn MediaStore> =
        Arc::new(FirebaseStorageClient::from_settings(&configuration.storage)?);
    let challenge_issuer: Arc<dyn ChallengeIssuer> =
        Arc::new(RecaptchaChallengeIssuer::new(&configuration.challenge));

    let session_hub = web::Data::new(SessionHub::new(
        Arc::new(AuthorizationResolver::new(profile_store.clone())),
        challenge_issuer,
        configuration.secret.jwt.expiry,
    ));
    spawn_session_pruner(
        session_hub.clone(),
        configuration.auth.session_prune_interval(),
    );

    let max_upload_size = configuration.storage.max_upload_size;
    let workers = configuration.application.workers;
    let application = configuration.application;
    let db_pool = web::Data::new(db_pool);
    let profile_store = web::Data::from(profile_store);
    let identity_provider = web::Data::from(identity_provider);
    let media_store = web::Data::from(media_store);
    let upload_tracker = web::Data::new(UploadTracker::new());
    let secret_obj = web::Data::new(configuration.secret);
    let auth_setting_obj = web::Data::new(configuration.auth);
    let contact_obj = web::Data::new(configuration.contact);
    let storage_obj = web::Data::new(configuration.storage);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors(&application))
            .wrap(TracingLogger::default())
            .app_data(web::PayloadConfig::new(max_upload_size))
            .app_data(db_pool.clone())
            .app_data(session_hub.clone())
            .app_data(profile_store.clone())
            .app_data(identity_provider.clone())
            .app_data(media_store.clone())
            .app_data(upload_tracker.clone())
            .app_data(secret_obj.clone())
            .app_data(auth_setting_obj.clone())
            .app_data(contact_obj.clone())
            .app_data(storage_obj.clone())
            .configure(main_route)
    })
    .workers(workers)
    .listen(listener)?
    .run();

    Ok(server)
}
