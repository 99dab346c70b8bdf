use serde_json::{Map, Value};

use crate::rotate_error::RotateError;
use crate::rotation::RealityKeyPair;
use crate::{create_rotate_error, create_rotate_error_result};

/// 3x-ui inbound as returned by `/panel/api/inbounds/list`.
/// Only the fields we touch are typed, everything else is carried along in
/// `other` so the update posts the object back unchanged.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Inbound {
    pub id: u64,
    #[serde(default)]
    pub remark: String,
    /// JSON document stored as a string inside the inbound object.
    #[serde(rename = "streamSettings", default)]
    pub stream_settings: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Inbound {
    pub fn parse_stream_settings(&self) -> Result<StreamSettings, RotateError> {
        serde_json::from_str(&self.stream_settings)
            .map_err(|err| create_rotate_error!("cant parse streamSettings of inbound {}: {err}", self.id))
    }

    pub fn store_stream_settings(&mut self, settings: &StreamSettings) -> Result<(), RotateError> {
        self.stream_settings = serde_json::to_string(settings)?;
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StreamSettings {
    #[serde(default)]
    pub security: String,
    #[serde(rename = "realitySettings", skip_serializing_if = "Option::is_none")]
    pub reality_settings: Option<RealitySettings>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl StreamSettings {
    pub fn is_reality(&self) -> bool {
        self.security == "reality"
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RealitySettings {
    #[serde(rename = "serverNames", default)]
    pub server_names: Vec<String>,
    #[serde(rename = "shortIds", default)]
    pub short_ids: Vec<String>,
    #[serde(default)]
    pub target: String,
    /// MHSanaei keeps the private key at the root of realitySettings.
    #[serde(rename = "privateKey", default)]
    pub private_key: String,
    /// Nested object holding the public key, among others.
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl RealitySettings {
    /// The SNI the panel currently camouflages as.
    pub fn current_sni(&self) -> Option<&str> {
        self.server_names.first().map(String::as_str)
    }

    pub fn apply_rotation(&mut self, server_names: Vec<String>, short_ids: Vec<String>,
                          target: String, keys: &RealityKeyPair) {
        self.server_names = server_names;
        self.short_ids = short_ids;
        self.target = target;
        self.private_key = keys.private_key.clone();
        self.settings.insert("publicKey".to_string(), Value::String(keys.public_key.clone()));
    }
}

pub fn ensure_reality(settings: &StreamSettings, inbound_id: u64) -> Result<(), RotateError> {
    if settings.is_reality() {
        Ok(())
    } else {
        create_rotate_error_result!("inbound {inbound_id} is not using reality security ({})",
            if settings.security.is_empty() { "no security set" } else { settings.security.as_str() })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::{ensure_reality, Inbound};
    use crate::rotation::RealityKeyPair;

    const INBOUND_JSON: &str = r#"{
        "id": 3,
        "remark": "reality-in",
        "port": 443,
        "protocol": "vless",
        "enable": true,
        "streamSettings": "{\"network\":\"tcp\",\"security\":\"reality\",\"realitySettings\":{\"show\":false,\"target\":\"cdn.old.example:443\",\"serverNames\":[\"cdn.old.example\"],\"privateKey\":\"oldpriv\",\"shortIds\":[\"aabbccdd\"],\"settings\":{\"publicKey\":\"oldpub\",\"fingerprint\":\"chrome\"}}}"
    }"#;

    #[test]
    fn test_unknown_inbound_fields_survive_roundtrip() {
        let inbound: Inbound = serde_json::from_str(INBOUND_JSON).unwrap();
        assert_eq!(inbound.id, 3);
        assert_eq!(inbound.other.get("port"), Some(&Value::from(443)));
        let serialized = serde_json::to_value(&inbound).unwrap();
        assert_eq!(serialized.get("protocol"), Some(&Value::from("vless")));
        assert_eq!(serialized.get("enable"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_rotation_mutation() {
        let mut inbound: Inbound = serde_json::from_str(INBOUND_JSON).unwrap();
        let mut settings = inbound.parse_stream_settings().unwrap();
        ensure_reality(&settings, inbound.id).unwrap();

        let keys = RealityKeyPair {
            private_key: "newpriv".to_string(),
            public_key: "newpub".to_string(),
        };
        let reality = settings.reality_settings.as_mut().unwrap();
        assert_eq!(reality.current_sni(), Some("cdn.old.example"));
        reality.apply_rotation(
            vec!["fresh.example".to_string(), "www.fresh.example".to_string()],
            vec!["11223344".to_string()],
            "fresh.example:443".to_string(),
            &keys,
        );
        inbound.store_stream_settings(&settings).unwrap();

        let stored: Value = serde_json::from_str(&inbound.stream_settings).unwrap();
        let reality = &stored["realitySettings"];
        assert_eq!(reality["serverNames"], serde_json::json!(["fresh.example", "www.fresh.example"]));
        assert_eq!(reality["target"], "fresh.example:443");
        assert_eq!(reality["privateKey"], "newpriv");
        assert_eq!(reality["settings"]["publicKey"], "newpub");
        // untouched fields survive
        assert_eq!(reality["settings"]["fingerprint"], "chrome");
        assert_eq!(reality["show"], false);
        assert_eq!(stored["network"], "tcp");
    }

    #[test]
    fn test_non_reality_inbound_is_refused() {
        let json = INBOUND_JSON.replace("reality", "tls");
        let inbound: Inbound = serde_json::from_str(&json).unwrap();
        let settings = inbound.parse_stream_settings().unwrap();
        assert!(ensure_reality(&settings, inbound.id).is_err());
    }

    #[test]
    fn test_broken_stream_settings() {
        let mut inbound: Inbound = serde_json::from_str(INBOUND_JSON).unwrap();
        inbound.stream_settings = "{not json".to_string();
        assert!(inbound.parse_stream_settings().is_err());
    }
}
