pub mod authentication;
pub mod configuration;
pub mod contact_client;
pub mod domain;
pub mod email_client;
pub mod email_request;
pub mod relay;
pub mod routes;
pub mod startup;
pub mod telemetry;
