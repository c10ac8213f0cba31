use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use reqwest::Url;
use teloxide::adaptors::trace::Settings;
use teloxide::prelude::*;
use teloxide::types::{InputFile, WebhookInfo};
use teloxide::update_listeners::webhooks::{self, Options};
use teloxide::update_listeners::{Polling, UpdateListener};
use tracing::{error, info, warn};

use crate::bot;
use crate::config::{Config, WebhookConfig};
use crate::error::BotError;
use crate::platform::telegram::TelegramBot;
use crate::transport;

/// Long-poll window for `getUpdates`
pub const POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// Grace period for in-flight webhook requests on shutdown
const LISTENER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// How updates reach the bot. Chosen once at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateSource {
    Polling,
    Webhook(WebhookConfig),
}

impl UpdateSource {
    pub fn from_flag(use_webhook: bool, config: &Config) -> Self {
        if use_webhook {
            UpdateSource::Webhook(config.webhook.clone())
        } else {
            UpdateSource::Polling
        }
    }
}

impl fmt::Display for UpdateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateSource::Polling => write!(f, "long polling"),
            UpdateSource::Webhook(_) => write!(f, "webhook"),
        }
    }
}

/// Authenticated Bot API handle. Single use: consumed by `run`.
pub struct Session {
    bot: TelegramBot,
}

impl Session {
    /// Build the transport and check the token with `getMe`.
    /// In debug mode every request and response is traced.
    pub async fn init(config: &Config, debug_mode: bool) -> Result<Self, BotError> {
        let client = transport::build_client(&config.proxy)?;
        let bot =
            Bot::with_client(config.token.clone(), client).trace(trace_settings(debug_mode));

        let me = bot.get_me().await.map_err(BotError::Auth)?;
        info!("Authorized on account {}", me.username());
        info!("Debug mode: {}", debug_mode);

        Ok(Self { bot })
    }

    /// Acquire the update stream and consume it until shutdown
    pub async fn run(self, source: UpdateSource, config: Arc<Config>) -> Result<(), BotError> {
        match source {
            UpdateSource::Polling => {
                let listener = self.acquire_polling().await?;
                bot::start(self.bot.clone(), listener, config).await;
            }
            UpdateSource::Webhook(webhook) => {
                let listener = self.acquire_webhook(&webhook).await?;
                bot::start(self.bot.clone(), listener, config).await;
            }
        }
        Ok(())
    }

    /// Drop any registered webhook, then long-poll from offset zero
    pub async fn acquire_polling(&self) -> Result<Polling<TelegramBot>, BotError> {
        self.bot.delete_webhook().await?;
        info!("Webhook was deactivated");

        Ok(Polling::builder(self.bot.clone())
            .timeout(POLL_TIMEOUT)
            .build())
    }

    /// Register `host:port/<token>` with the uploaded certificate and serve
    /// that path over TLS, on all interfaces unless `listen` narrows it.
    pub async fn acquire_webhook(
        &self,
        webhook: &WebhookConfig,
    ) -> Result<impl UpdateListener<Err = Infallible>, BotError> {
        let port = parse_port(&webhook.port)?;
        let address = bind_address(&webhook.listen, port);
        let url = callback_url(&webhook.host, port, self.bot.inner().token())?;

        self.bot
            .set_webhook(url.clone())
            .certificate(InputFile::file(&webhook.cert))
            .await?;

        let status = self.bot.get_webhook_info().await?;
        check_webhook_status(&status)?;

        let tls = RustlsConfig::from_pem_file(&webhook.cert, &webhook.private_key)
            .await
            .map_err(BotError::Tls)?;

        let (listener, stop_flag, router) = webhooks::axum_no_setup(Options::new(address, url));
        spawn_tls_listener(address, tls, router, stop_flag);

        info!(
            "Webhook was activated on {}, listening on {}",
            redacted_url(&webhook.host, port),
            address
        );
        info!(
            "Webhook status: custom certificate {}, pending updates {}",
            status.has_custom_certificate, status.pending_update_count
        );
        Ok(listener)
    }
}

/// Serve the webhook router in the background. Failures are logged only;
/// the dispatcher keeps waiting on the stream.
fn spawn_tls_listener(
    address: SocketAddr,
    tls: RustlsConfig,
    router: axum::Router,
    stop_flag: impl Future<Output = ()> + Send + 'static,
) {
    let handle = Handle::new();

    let shutdown = handle.clone();
    tokio::spawn(async move {
        stop_flag.await;
        shutdown.graceful_shutdown(Some(LISTENER_SHUTDOWN_GRACE));
    });

    tokio::spawn(async move {
        if let Err(e) = axum_server::bind_rustls(address, tls)
            .handle(handle)
            .serve(router.into_make_service())
            .await
        {
            error!("Webhook listener on {} failed: {}", address, e);
        }
    });
}

fn trace_settings(debug_mode: bool) -> Settings {
    if debug_mode {
        Settings::TRACE_REQUESTS_VERBOSE | Settings::TRACE_RESPONSES_VERBOSE
    } else {
        Settings::empty()
    }
}

/// A non-zero last error date means Telegram could not reach the callback
fn check_webhook_status(status: &WebhookInfo) -> Result<(), BotError> {
    if status
        .last_error_date
        .is_some_and(|date| date.timestamp() != 0)
    {
        error!(
            "Webhook status reports an error, pending updates: {}",
            status.pending_update_count
        );
        return Err(BotError::WebhookRegistration {
            message: status.last_error_message.clone().unwrap_or_default(),
        });
    }
    Ok(())
}

fn parse_port(port: &str) -> Result<u16, BotError> {
    port.trim()
        .parse()
        .map_err(|_| BotError::InvalidWebhook(format!("invalid port {:?}", port)))
}

fn bind_address(listen: &str, port: u16) -> SocketAddr {
    let any = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    let ip = match listen.trim() {
        "" => any,
        value => value.parse().unwrap_or_else(|_| {
            warn!(
                "Listen address {:?} is not an IP address, binding all interfaces",
                listen
            );
            any
        }),
    };
    SocketAddr::new(ip, port)
}

/// The token is the path segment, so only Telegram knows the route
fn callback_url(host: &str, port: u16, token: &str) -> Result<Url, BotError> {
    let raw = format!("{}:{}/{}", host.trim().trim_end_matches('/'), port, token);
    Url::parse(&raw).map_err(|e| {
        BotError::InvalidWebhook(format!("{}: {}", redacted_url(host, port), e))
    })
}

fn redacted_url(host: &str, port: u16) -> String {
    format!("{}:{}/<token>", host.trim().trim_end_matches('/'), port)
}
