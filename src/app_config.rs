use config::Config;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    api: Api,
    tracker: Tracker,
}

impl AppConfig {
    pub fn load() -> Self {
        Config::builder()
            .set_default("tracker.retry_interval", "10m")
            .unwrap()
            .set_default("tracker.max_stored_samples", 1000)
            .unwrap()
            .add_source(config::File::with_name("config").required(true))
            .add_source(config::File::with_name("config_local").required(false))
            .add_source(config::Environment::default())
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    pub fn api(&self) -> &Api {
        &self.api
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }
}

#[derive(Debug, Deserialize)]
pub struct Api {
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl Api {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }
}

#[derive(Debug, Deserialize)]
pub struct Tracker {
    /// Delay before a failed upload is attempted again.
    #[serde(with = "humantime_serde")]
    retry_interval: Duration,
    /// Upper bound on buffered samples; the oldest are evicted beyond it.
    max_stored_samples: usize,
}

impl Tracker {
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn max_stored_samples(&self) -> usize {
        self.max_stored_samples
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                api: Api {
                    base_url: "https://api.url".to_string(),
                    client_id: "test-app".to_string(),
                    client_secret: "secret".to_string(),
                },
                tracker: Tracker {
                    retry_interval: Duration::from_secs(600),
                    max_stored_samples: 1000,
                },
            },
        }
    }

    pub fn base_url(mut self, url: String) -> Self {
        self.config.api.base_url = url;
        self
    }

    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.config.tracker.retry_interval = interval;
        self
    }

    pub fn max_stored_samples(mut self, max: usize) -> Self {
        self.config.tracker.max_stored_samples = max;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
