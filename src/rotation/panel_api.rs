use log::info;

use crate::model::{Inbound, PanelConfig};
use crate::rotate_error::RotateError;
use crate::utils::create_client;
use crate::{create_rotate_error, create_rotate_error_result};

/// Response envelope of the MHSanaei 3x-ui api.
#[derive(Debug, serde::Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub msg: String,
    pub obj: Option<T>,
}

/// Session-based client for a 3x-ui panel. `login` must succeed before the
/// api calls, the session cookie lives in the client's cookie store.
pub struct PanelClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    inbound_id: u64,
}

impl PanelClient {
    pub fn new(cfg: &PanelConfig) -> Result<Self, RotateError> {
        let client = create_client(cfg).build()?;
        Ok(Self {
            client,
            base_url: cfg.url.clone(),
            username: cfg.username.clone(),
            password: cfg.password.clone(),
            inbound_id: cfg.inbound_id,
        })
    }

    pub async fn login(&self) -> Result<(), RotateError> {
        let url = format!("{}/login", self.base_url);
        let response = self.client
            .post(&url)
            .form(&[("username", self.username.as_str()), ("password", self.password.as_str())])
            .send()
            .await?
            .error_for_status()?;
        let body: ApiResponse<serde_json::Value> = response.json().await?;
        if body.success {
            info!("Panel login successful");
            Ok(())
        } else {
            create_rotate_error_result!("panel login failed: {}", body.msg)
        }
    }

    pub async fn get_inbound(&self) -> Result<Inbound, RotateError> {
        let url = format!("{}/panel/api/inbounds/list", self.base_url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: ApiResponse<Vec<Inbound>> = response.json().await?;
        if !body.success {
            return create_rotate_error_result!("inbound list request failed: {}", body.msg);
        }
        body.obj
            .unwrap_or_default()
            .into_iter()
            .find(|inbound| inbound.id == self.inbound_id)
            .ok_or_else(|| create_rotate_error!("inbound {} not found on panel", self.inbound_id))
    }

    pub async fn update_inbound(&self, inbound: &Inbound) -> Result<(), RotateError> {
        let url = format!("{}/panel/api/inbounds/update/{}", self.base_url, self.inbound_id);
        let response = self.client.post(&url).json(inbound).send().await?.error_for_status()?;
        let body: ApiResponse<serde_json::Value> = response.json().await?;
        if body.success {
            info!("Inbound {} updated", self.inbound_id);
            Ok(())
        } else {
            create_rotate_error_result!("inbound update failed: {}", body.msg)
        }
    }
}
