use serde::Deserialize;
use std::env;

/// Exactly 5 worker tasks, per the core contract — not configurable.
pub const WORKER_COUNT: usize = 5;

pub const QUEUE_NAME: &str = "events_queue";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub broker_url: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            broker_url: env::var("BROKER_URL")
                .unwrap_or_else(|_| "redis://broker:6379/0".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
        })
    }
}
