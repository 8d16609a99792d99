mod config;

use std::sync::Arc;

use clap::Parser;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use tibia_assets::Registry;
use tibia_automation::{AutomationModule, LightHackConfig, LightHackModule};
use tibia_crypto::{RsaPrivateKey, RsaPublicKey};
use tibia_session::ProxyConfig;

use config::Config;

#[derive(Parser, Debug)]
#[command(about = "Tibia 7.72 MITM proxy")]
struct Args {
    /// Path to the TOML configuration file. Written with defaults on first
    /// run if it does not exist yet.
    #[arg(long, default_value = "tibia-proxy.toml")]
    config: std::path::PathBuf,
}

fn build_proxy_config(config: &Config) -> eyre::Result<ProxyConfig> {
    let registry = if config.items_path.is_empty() {
        Registry::empty()
    } else {
        Registry::load(&config.items_path)?
    };

    Ok(ProxyConfig {
        proxy_private_key: RsaPrivateKey::from_decimal_components(
            &config.proxy_rsa_modulus,
            &config.proxy_rsa_private_exponent,
        )?,
        backend_public_key: RsaPublicKey::from_decimal_modulus(&config.backend_rsa_modulus)?,
        registry: Arc::new(registry),
        world_name: config.world_name.clone(),
        motd_banner: config.motd_banner.clone(),
        proxy_public_ip: config::parse_ipv4_le(&config.proxy_public_ip)?,
        proxy_game_port: config.proxy_game_port,
        dial_timeout: std::time::Duration::from_secs(5),
    })
}

fn build_automation_modules(config: &Config) -> Vec<Arc<dyn AutomationModule<TcpStream>>> {
    let mut modules: Vec<Arc<dyn AutomationModule<TcpStream>>> = Vec::new();
    if let Some(light_hack) = &config.automation.light_hack {
        modules.push(Arc::new(LightHackModule::new(LightHackConfig {
            level: light_hack.level,
            color: light_hack.color,
        })));
    }
    modules
}

async fn run_login_listener(
    listen_addr: String,
    backend_addr: String,
    config: Arc<ProxyConfig>,
) -> eyre::Result<()> {
    let listener = TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| eyre::eyre!("failed to bind login listener on {listen_addr}: {e}"))?;
    info!("login portal listening on {listen_addr}, forwarding to {backend_addr}");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("login accept error: {e}");
                continue;
            }
        };
        info!("login connection from {peer}");

        let config = config.clone();
        let backend_addr = backend_addr.clone();
        tokio::spawn(async move {
            let result = tibia_session::run_login_session(stream, config, || async move {
                TcpStream::connect(&backend_addr).await
            })
            .await;
            if let Err(e) = result {
                warn!("login session with {peer} ended: {e}");
            }
        });
    }
}

async fn run_game_listener(
    listen_addr: String,
    backend_addr: String,
    config: Arc<ProxyConfig>,
    modules: Arc<Vec<Arc<dyn AutomationModule<TcpStream>>>>,
) -> eyre::Result<()> {
    let listener = TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| eyre::eyre!("failed to bind game listener on {listen_addr}: {e}"))?;
    info!("game portal listening on {listen_addr}, forwarding to {backend_addr}");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("game accept error: {e}");
                continue;
            }
        };
        info!("game connection from {peer}");

        let config = config.clone();
        let backend_addr = backend_addr.clone();
        let modules = (*modules).clone();
        tokio::spawn(async move {
            let result = tibia_session::run_game_session(stream, config, modules, || async move {
                TcpStream::connect(&backend_addr).await
            })
            .await;
            if let Err(e) = result {
                warn!("game session with {peer} ended: {e}");
            }
        });
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
            |_| tracing_subscriber::EnvFilter::new("tibia_proxy=info,tibia_session=info,warn"),
        ))
        .init();

    info!("Tibia 7.72 MITM proxy starting");

    let proxy_config = Arc::new(build_proxy_config(&config)?);
    let automation_modules = Arc::new(build_automation_modules(&config));

    let login_task = tokio::spawn(run_login_listener(
        config.login_listen_addr.clone(),
        config.backend_login_addr.clone(),
        proxy_config.clone(),
    ));
    let game_task = tokio::spawn(run_game_listener(
        config.game_listen_addr.clone(),
        config.backend_game_addr.clone(),
        proxy_config.clone(),
        automation_modules,
    ));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down on Ctrl+C");
            Ok(())
        }
        res = login_task => res?,
        res = game_task => res?,
    }
}
