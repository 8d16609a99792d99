//! Rewrites a real server's login-portal reply so every character points
//! back at this proxy's own game port instead of the real game server,
//! and replaces the MOTD with the proxy's own banner (spec §4.7 step 5,
//! §8.2).

use std::time::{SystemTime, UNIX_EPOCH};

use tibia_protocol::login::{LoginResult, Motd};

use crate::ProxyConfig;

/// Overwrites every character list entry's world address with the proxy's
/// own, and replaces the MOTD if the reply carried one. Disconnect replies
/// (no character list) pass through untouched.
pub fn rewrite_login_reply(result: &mut LoginResult, config: &ProxyConfig) {
    if let Some(list) = &mut result.character_list {
        for entry in &mut list.characters {
            entry.world_name = config.world_name.clone();
            entry.world_ip = config.proxy_public_ip;
            entry.world_port = config.proxy_game_port;
        }
    }

    if result.motd.is_some() {
        let id = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        result.motd = Some(Motd {
            id: id.to_string(),
            message: config.motd_banner.clone(),
        });
    }
}
