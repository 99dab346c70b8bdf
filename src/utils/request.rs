use std::time::Duration;

use crate::model::PanelConfig;

/// Client builder for panel requests. The cookie store carries the
/// 3x-ui session cookie between login and the api calls.
pub fn create_client(cfg: &PanelConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .cookie_store(true)
        .connect_timeout(Duration::from_secs(u64::from(cfg.connect_timeout_secs)))
        .timeout(Duration::from_secs(u64::from(cfg.request_timeout_secs)))
        .danger_accept_invalid_certs(cfg.accept_insecure_ssl_certificates)
}
