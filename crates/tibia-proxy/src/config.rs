//! Configuration file handling: a `tibia-proxy.toml` next to the binary
//! (or at a path given with `--config`), loaded with the load-or-write-
//! default pattern so a first run always produces an editable file.

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub login_listen_addr: String,
    pub game_listen_addr: String,
    pub backend_login_addr: String,
    pub backend_game_addr: String,

    /// This proxy's own public IP, written into every rewritten
    /// character-list entry so the client dials back here instead of the
    /// real game server.
    pub proxy_public_ip: String,
    pub proxy_game_port: u16,

    /// Decimal-string RSA components; see `tibia_crypto::rsa` for why the
    /// public exponent is always 65537 and need not be stored.
    pub proxy_rsa_modulus: String,
    pub proxy_rsa_private_exponent: String,
    pub backend_rsa_modulus: String,

    pub items_path: String,
    pub motd_banner: String,
    pub world_name: String,

    #[serde(default)]
    pub automation: AutomationConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AutomationConfig {
    pub light_hack: Option<LightHackEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LightHackEntry {
    pub level: u8,
    pub color: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login_listen_addr: "0.0.0.0:7171".into(),
            game_listen_addr: "0.0.0.0:7172".into(),
            backend_login_addr: "127.0.0.1:7171".into(),
            backend_game_addr: "127.0.0.1:7172".into(),
            proxy_public_ip: "127.0.0.1".into(),
            proxy_game_port: 7172,
            // A toy 1024-bit-sized placeholder; operators are expected to
            // replace this with the proxy's real generated keypair.
            proxy_rsa_modulus: "0".into(),
            proxy_rsa_private_exponent: "0".into(),
            backend_rsa_modulus: "0".into(),
            items_path: "items.json".into(),
            motd_banner: "Welcome to the proxy.".into(),
            world_name: "Proxied".into(),
            automation: AutomationConfig {
                light_hack: Some(LightHackEntry {
                    level: 255,
                    color: 215,
                }),
            },
        }
    }
}

impl Config {
    /// Loads `path`, or writes `Config::default()` to it and returns that
    /// default when the file does not exist yet.
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let text = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&text)?)
        } else {
            let config = Config::default();
            std::fs::write(path, toml::to_string_pretty(&config)?)?;
            Ok(config)
        }
    }
}

/// Parses a dotted-quad IPv4 address into the little-endian `u32` the wire
/// format expects (see `tibia_protocol::login::CharacterEntry::world_ip`).
pub fn parse_ipv4_le(addr: &str) -> eyre::Result<u32> {
    let ip: Ipv4Addr = addr.parse()?;
    Ok(u32::from_le_bytes(ip.octets()))
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("tibia-proxy.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loopback_to_expected_le_u32() {
        assert_eq!(parse_ipv4_le("127.0.0.1").unwrap(), 0x0100_007F);
    }

    #[test]
    fn load_writes_default_when_missing() {
        let dir = std::env::temp_dir().join(format!("tibia-proxy-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tibia-proxy.toml");
        let _ = std::fs::remove_file(&path);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.login_listen_addr, "0.0.0.0:7171");
        assert!(path.exists());

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.game_listen_addr, config.game_listen_addr);

        std::fs::remove_dir_all(&dir).ok();
    }
}
