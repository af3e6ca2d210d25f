use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub media_root: String,
    pub media_public_base: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string());
        let media_public_base =
            env::var("MEDIA_PUBLIC_BASE").unwrap_or_else(|_| "/media".to_string());
        Ok(Self {
            database_url,
            host,
            port,
            media_root,
            media_public_base,
        })
    }
}
