//! HTTP API handlers for bau-voice

pub mod health;
pub mod settings;
pub mod voice;

pub use health::health_routes;
pub use settings::settings_routes;
pub use voice::voice_routes;
