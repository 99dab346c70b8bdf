#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

mod gate;
mod model;
mod rotate_error;
mod rotation;
mod utils;

use clap::Parser;
use log::{error, info};

use crate::model::MainConfig;
use crate::rotation::PanelClient;
use crate::utils::{get_default_config_file_path, get_default_config_path, init_logger,
                   read_config, resolve_directory_path, resolve_env_var};

#[derive(Parser)]
#[command(name = "xui-rotate")]
#[command(version)]
#[command(about = "Scheduled Reality rotation for 3x-ui panels", long_about = None)]
struct Args {
    /// The config directory
    #[arg(short = 'p', long = "config-path")]
    config_path: Option<String>,

    /// The config file
    #[arg(short = 'c', long = "config")]
    config_file: Option<String>,

    /// log level
    #[arg(short = 'l', long = "log-level", default_missing_value = "info")]
    log_level: Option<String>,

    /// Bypass the schedule gate and rotate immediately
    #[arg(short = None, long, default_value_t = false, default_missing_value = "true")]
    force: bool,

    /// Run all rotation steps but skip the panel update
    #[arg(short = None, long = "dry-run", default_value_t = false, default_missing_value = "true")]
    dry_run: bool,

    /// Probe every pool domain for TLS 1.3 support and report
    #[arg(short = None, long = "check-domains", default_value_t = false, default_missing_value = "true")]
    check_domains: bool,

    #[arg(short = None, long = "healthcheck", default_value_t = false, default_missing_value = "true")]
    healthcheck: bool,
}

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config_path: String = resolve_directory_path(&resolve_env_var(
        &args.config_path.as_ref().map_or_else(get_default_config_path, ToString::to_string)));
    let config_file: String = resolve_env_var(
        &args.config_file.as_ref().map_or_else(|| get_default_config_file_path(&config_path), ToString::to_string));

    init_logger(args.log_level.as_ref(), config_file.as_str());

    info!("Version: {VERSION}");

    let config = read_config(&config_path, &config_file).unwrap_or_else(|err| exit!("{err}"));
    print_info(&config);

    if args.healthcheck {
        let healthy = healthcheck(&config).await;
        std::process::exit(i32::from(!healthy));
    }

    let result = if args.check_domains {
        rotation::check_domains(&config).await
    } else if args.force {
        gate::run_rotation(&config, args.dry_run).await
    } else {
        gate::run_gate(&config, args.dry_run).await
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => exit!("{err}"),
    }
}

fn print_info(config: &MainConfig) {
    info!("Current time: {}", chrono::offset::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("Config file: {}", config.t_config_file_path);
    info!("Domains file: {}", config.rotation.t_domains_file);
    info!("Schedule: {} on days [{}] ({})",
        config.schedule.hour, config.schedule.days.join(","), config.schedule.timezone);
    info!("Panel: {}", config.panel.url);
}

async fn healthcheck(config: &MainConfig) -> bool {
    let login = match PanelClient::new(&config.panel) {
        Ok(client) => client.login().await,
        Err(err) => Err(err),
    };
    match login {
        Ok(()) => true,
        Err(err) => {
            error!("Healthcheck failed: {err}");
            false
        }
    }
}
