use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::configuration::Settings;
use crate::relay::RelayState;
use crate::routes::{contact, health_check, method_not_allowed, not_found, relay_submission};

/// The bound but not yet running HTTP server.
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, std::io::Error> {
        let relay_state = RelayState::from_settings(&configuration);

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address)?;
        // Port 0 lets the OS choose, read back the one we got
        let port = listener.local_addr()?.port();
        let server = run(listener, relay_state)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(listener: TcpListener, relay_state: RelayState) -> Result<Server, std::io::Error> {
    // `web::Data` is an `Arc`, every worker shares the same read-only relay
    let relay_state = web::Data::new(relay_state);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(health_check))
            .service(
                web::resource("/contact")
                    .route(web::post().to(relay_submission))
                    .default_service(web::to(method_not_allowed)),
            )
            .service(
                web::resource("/api/contact")
                    .route(web::post().to(contact))
                    .default_service(web::to(method_not_allowed)),
            )
            .default_service(web::to(not_found))
            .app_data(relay_state.clone())
    })
    .listen(listener)?
    .run();
    // No .await here
    Ok(server)
}
