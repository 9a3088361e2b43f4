use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::config::ScrapeConfig;

pub fn build_http_client(config: &ScrapeConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .context("failed to build http client")
}
