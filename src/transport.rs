use std::time::Duration;

use reqwest::{Proxy, Url};
use tracing::info;

use crate::config::ProxyConfig;
use crate::error::BotError;

/// Per-request timeout. Must stay above the long-poll window or every
/// `getUpdates` call is cut short by the client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Build the HTTP client used for every Bot API call.
/// When the proxy is configured all connections are tunnelled through it.
pub fn build_client(proxy: &ProxyConfig) -> Result<reqwest::Client, BotError> {
    let mut builder = teloxide::net::default_reqwest_settings().timeout(REQUEST_TIMEOUT);

    if proxy.is_enabled() {
        let url = socks5_url(proxy)?;
        builder = builder.proxy(Proxy::all(url).map_err(|e| BotError::Proxy(e.to_string()))?);
        info!(
            "Using SOCKS5 proxy {}:{}",
            proxy.url.trim(),
            proxy.port.trim()
        );
    }

    Ok(builder.build()?)
}

/// `socks5h` so hostnames are resolved on the proxy side
fn socks5_url(proxy: &ProxyConfig) -> Result<Url, BotError> {
    let host = proxy.url.trim();
    let port: u16 = proxy
        .port
        .trim()
        .parse()
        .map_err(|_| BotError::Proxy(format!("invalid port {:?}", proxy.port)))?;

    let mut url = Url::parse(&format!("socks5h://{}:{}", host, port))
        .map_err(|e| BotError::Proxy(format!("{}:{}: {}", host, port, e)))?;

    if !proxy.login.is_empty() {
        url.set_username(&proxy.login)
            .map_err(|_| BotError::Proxy("cannot embed login".to_string()))?;
        url.set_password(Some(&proxy.password))
            .map_err(|_| BotError::Proxy("cannot embed password".to_string()))?;
    }

    Ok(url)
}
