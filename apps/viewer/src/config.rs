use std::{collections::HashMap, fs};

use github_client::DEFAULT_GRAPHQL_ENDPOINT;

#[derive(Debug)]
pub struct Settings {
    pub endpoint: String,
    pub token: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GRAPHQL_ENDPOINT.to_string(),
            token: String::new(),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("viewer.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("endpoint") {
                settings.endpoint = v.clone();
            }
            if let Some(v) = file_cfg.get("token") {
                settings.token = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("GITHUB_GRAPHQL_URL") {
        settings.endpoint = v;
    }
    if let Ok(v) = std::env::var("GITHUB_TOKEN") {
        settings.token = v;
    }

    settings
}
