// src/core/net.rs
//
// Blocking HTTP against the wiki. Retries with linear backoff, custom
// User-Agent, and an opt-out of environment proxy settings for networks
// where the proxy blocks the site.

use std::{env, error::Error, thread, time::Duration};

use reqwest::blocking::Client;

use crate::config::{
    BACKOFF_MS, BASE_URL, POLITE_DELAY_MS, PROXY_BYPASS_VAR, RETRIES, TIMEOUT_S, USER_AGENT,
};

pub struct WikiClient {
    base_url: String,
    client: Client,
}

impl WikiClient {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, Box<dyn Error>> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(TIMEOUT_S));

        if proxy_disabled() {
            builder = builder.no_proxy();
        }

        Ok(Self {
            base_url: s!(base_url),
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a wiki path (or absolute URL) as text.
    pub fn fetch(&self, path_or_url: &str) -> Result<String, Box<dyn Error>> {
        let body = self.get(path_or_url)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Fetch raw bytes, e.g. an icon image.
    pub fn fetch_bytes(&self, path_or_url: &str) -> Result<Vec<u8>, Box<dyn Error>> {
        self.get(path_or_url)
    }

    fn get(&self, path_or_url: &str) -> Result<Vec<u8>, Box<dyn Error>> {
        let url = if path_or_url.starts_with("http") {
            s!(path_or_url)
        } else {
            format!("{}{}", self.base_url, path_or_url)
        };

        let mut last_error: Option<reqwest::Error> = None;
        for attempt in 1..=RETRIES {
            let result = self
                .client
                .get(&url)
                .send()
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.bytes());

            match result {
                Ok(bytes) => {
                    thread::sleep(Duration::from_millis(POLITE_DELAY_MS));
                    return Ok(bytes.to_vec());
                }
                Err(e) => {
                    loge!("GET {} failed (attempt {}/{}): {}", url, attempt, RETRIES, e);
                    last_error = Some(e);
                    if attempt < RETRIES {
                        thread::sleep(Duration::from_millis(BACKOFF_MS * attempt as u64));
                    }
                }
            }
        }

        let mut hint = s!();
        if last_error
            .as_ref()
            .is_some_and(|e| e.to_string().contains("Tunnel connection failed"))
        {
            hint = format!(
                " Set {PROXY_BYPASS_VAR}=1 to bypass proxy environment variables \
                 if your network allows direct egress."
            );
        }
        Err(format!("Failed to fetch {url}.{hint}").into())
    }
}

fn proxy_disabled() -> bool {
    env::var(PROXY_BYPASS_VAR)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
