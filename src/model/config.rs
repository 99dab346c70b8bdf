use chrono_tz::Tz;

use crate::rotate_error::RotateError;
use crate::utils::get_default_domains_file_path;
use crate::{create_rotate_error, create_rotate_error_result};

const fn default_inbound_id() -> u64 { 1 }
const fn default_short_id_count() -> usize { 4 }
const fn default_tls_port() -> u16 { 443 }
const fn default_tls_timeout_secs() -> u64 { 3 }
const fn default_connect_timeout_secs() -> u32 { 6 }
const fn default_request_timeout_secs() -> u32 { 30 }
fn default_timezone() -> String { String::from("Asia/Yekaterinburg") }
fn default_tz() -> Tz { chrono_tz::UTC }

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LogConfigDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Lenient view of the config file used to bootstrap the logger before the
/// full config is parsed and validated.
#[derive(Debug, Default, serde::Deserialize)]
pub struct LogLevelConfig {
    #[serde(default)]
    pub log: Option<LogConfigDto>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Target hour, zero-padded 2-digit, `00`-`23`.
    pub hour: String,
    /// Target days of month, zero-padded 2-digit, `01`-`31`.
    pub days: Vec<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(skip, default)]
    pub t_hour: u32,
    #[serde(skip, default)]
    pub t_days: Vec<u32>,
    #[serde(skip, default = "default_tz")]
    pub t_timezone: Tz,
}

fn parse_two_digit(value: &str, min: u32, max: u32, field: &str) -> Result<u32, RotateError> {
    if value.len() != 2 || !value.chars().all(|c| c.is_ascii_digit()) {
        return create_rotate_error_result!("schedule.{field} '{value}' must be a zero-padded 2-digit value");
    }
    let parsed = value.parse::<u32>().map_err(|err| create_rotate_error!("schedule.{field} '{value}': {err}"))?;
    if parsed < min || parsed > max {
        return create_rotate_error_result!("schedule.{field} '{value}' out of range {min:02}-{max:02}");
    }
    Ok(parsed)
}

impl ScheduleConfig {
    pub fn prepare(&mut self) -> Result<(), RotateError> {
        self.t_hour = parse_two_digit(&self.hour, 0, 23, "hour")?;
        if self.days.is_empty() {
            return create_rotate_error_result!("schedule.days must not be empty");
        }
        let mut days = Vec::with_capacity(self.days.len());
        for day in &self.days {
            days.push(parse_two_digit(day, 1, 31, "days")?);
        }
        days.sort_unstable();
        days.dedup();
        self.t_days = days;
        self.t_timezone = self.timezone.parse::<Tz>()
            .map_err(|err| create_rotate_error!("invalid schedule.timezone '{}': {err}", self.timezone))?;
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PanelConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_inbound_id")]
    pub inbound_id: u64,
    #[serde(default)]
    pub accept_insecure_ssl_certificates: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u32,
}

impl PanelConfig {
    pub fn prepare(&mut self) -> Result<(), RotateError> {
        let parsed = url::Url::parse(&self.url)
            .map_err(|err| create_rotate_error!("invalid panel.url: {err}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return create_rotate_error_result!("panel.url must be http or https");
        }
        while self.url.ends_with('/') {
            self.url.pop();
        }
        if self.username.trim().is_empty() || self.password.trim().is_empty() {
            return create_rotate_error_result!("panel.username and panel.password must be set");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotationConfig {
    pub domains_file: Option<String>,
    #[serde(default = "default_short_id_count")]
    pub short_id_count: usize,
    #[serde(default = "default_tls_port")]
    pub tls_port: u16,
    #[serde(default = "default_tls_timeout_secs")]
    pub tls_timeout_secs: u64,
    /// When set, the gate runs this command instead of the built-in engine.
    pub exec: Option<ExecConfig>,
    #[serde(skip, default)]
    pub t_domains_file: String,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            domains_file: None,
            short_id_count: default_short_id_count(),
            tls_port: default_tls_port(),
            tls_timeout_secs: default_tls_timeout_secs(),
            exec: None,
            t_domains_file: String::new(),
        }
    }
}

impl RotationConfig {
    pub fn prepare(&mut self, config_path: &str) -> Result<(), RotateError> {
        // Xray accepts at most 8 shortIds per inbound
        if self.short_id_count == 0 || self.short_id_count > 8 {
            return create_rotate_error_result!("rotation.short_id_count must be between 1 and 8");
        }
        if self.tls_timeout_secs == 0 {
            return create_rotate_error_result!("rotation.tls_timeout_secs must be greater than 0");
        }
        if let Some(exec) = self.exec.as_ref() {
            if exec.program.trim().is_empty() {
                return create_rotate_error_result!("rotation.exec.program must not be empty");
            }
        }
        self.t_domains_file = self.domains_file.clone()
            .unwrap_or_else(|| get_default_domains_file_path(config_path));
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MainConfig {
    #[serde(default)]
    pub log: Option<LogConfigDto>,
    pub schedule: ScheduleConfig,
    pub panel: PanelConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(skip, default)]
    pub t_config_path: String,
    #[serde(skip, default)]
    pub t_config_file_path: String,
}

impl MainConfig {
    pub fn prepare(&mut self) -> Result<(), RotateError> {
        self.schedule.prepare()?;
        self.panel.prepare()?;
        self.rotation.prepare(&self.t_config_path)?;
        Ok(())
    }
}
