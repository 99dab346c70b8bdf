mod domains;
mod keys;
mod panel_api;
mod tls_check;

use std::path::Path;
use std::time::Duration;

use log::{info, warn};

pub use self::keys::RealityKeyPair;
pub use self::panel_api::PanelClient;

use crate::model::{ensure_reality, MainConfig};
use crate::rotate_error::RotateError;
use crate::create_rotate_error;

/// One full rotation cycle against the panel:
/// login, fetch the inbound, pick a fresh TLS-1.3 capable domain, generate
/// new key material and push the patched Reality settings back.
pub async fn rotate(cfg: &MainConfig, dry_run: bool) -> Result<(), RotateError> {
    info!("Starting Reality rotation");
    let client = PanelClient::new(&cfg.panel)?;
    client.login().await?;

    let mut inbound = client.get_inbound().await?;
    info!("Target inbound: {}", inbound.remark);

    let mut stream_settings = inbound.parse_stream_settings()?;
    ensure_reality(&stream_settings, cfg.panel.inbound_id)?;
    let reality = stream_settings.reality_settings.as_mut()
        .ok_or_else(|| create_rotate_error!("inbound {} has no reality settings", cfg.panel.inbound_id))?;

    let pool = domains::load_domains(Path::new(&cfg.rotation.t_domains_file))?;
    let current_root = reality.current_sni().map(|sni| domains::root_domain(sni).to_string());
    let candidates = domains::candidates(&pool, current_root.as_deref());

    let timeout = Duration::from_secs(cfg.rotation.tls_timeout_secs);
    let selected = select_domain(candidates, cfg.rotation.tls_port, timeout).await?;

    let server_names = domains::build_server_names(&selected);
    let target = format!("{selected}:{}", cfg.rotation.tls_port);
    let key_pair = keys::generate_keypair()?;
    let short_ids = keys::generate_short_ids(cfg.rotation.short_id_count);

    info!("Selected domain: {selected}");
    info!("Target (dest): {target}");
    info!("New public key: {}", key_pair.public_key);

    reality.apply_rotation(server_names, short_ids, target, &key_pair);
    inbound.store_stream_settings(&stream_settings)?;

    if dry_run {
        info!("Dry run, skipping panel update");
        return Ok(());
    }
    client.update_inbound(&inbound).await?;
    info!("Rotation successful");
    Ok(())
}

/// Walks the shuffled candidate list and returns the first domain that
/// passes the TLS 1.3 probe. No candidate passing aborts the rotation,
/// a broken camouflage target would kill connectivity for all clients.
async fn select_domain(candidates: Vec<String>, port: u16, timeout: Duration) -> Result<String, RotateError> {
    if candidates.is_empty() {
        return Err(create_rotate_error!("rotation domain pool is empty"));
    }
    let selected = tokio::task::spawn_blocking(move || {
        for candidate in candidates {
            let domain = domains::root_domain(&candidate).to_string();
            match tls_check::check_domain_tls13(&domain, port, timeout) {
                Ok(()) => return Some(domain),
                Err(err) => warn!("Skipping {domain}: {err}"),
            }
        }
        None
    })
    .await
    .map_err(|err| create_rotate_error!("tls probe task failed: {err}"))?;

    selected.ok_or_else(|| {
        create_rotate_error!("no domain in the pool passed the TLS 1.3 check, aborting rotation to preserve connectivity")
    })
}

/// `--check-domains`: probe the whole pool and report, exit code 0 when at
/// least one domain qualifies.
pub async fn check_domains(cfg: &MainConfig) -> Result<i32, RotateError> {
    let pool = domains::load_domains(Path::new(&cfg.rotation.t_domains_file))?;
    if pool.is_empty() {
        return Err(create_rotate_error!("rotation domain pool is empty"));
    }
    let port = cfg.rotation.tls_port;
    let timeout = Duration::from_secs(cfg.rotation.tls_timeout_secs);
    let results = tokio::task::spawn_blocking(move || {
        pool.into_iter()
            .map(|candidate| {
                let domain = domains::root_domain(&candidate).to_string();
                let result = tls_check::check_domain_tls13(&domain, port, timeout);
                (domain, result)
            })
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|err| create_rotate_error!("tls probe task failed: {err}"))?;

    let mut passed = 0usize;
    for (domain, result) in results {
        match result {
            Ok(()) => {
                passed += 1;
                info!("{domain}: TLS 1.3 ok");
            }
            Err(err) => warn!("{domain}: {err}"),
        }
    }
    info!("{passed} domain(s) usable for rotation");
    Ok(i32::from(passed == 0))
}
