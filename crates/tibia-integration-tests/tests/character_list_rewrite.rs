//! Scenario 2: the backend's login reply has its character list and MOTD
//! rewritten to point at this proxy before it reaches the client.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use tibia_assets::Registry;
use tibia_codec::{ByteReader, ByteWriter};
use tibia_protocol::login::{self, CharacterEntry, CharacterList, LoginResult, Motd};

#[tokio::test]
async fn login_reply_character_list_and_motd_point_at_the_proxy() {
    let handshake_bytes =
        tibia_integration_tests::build_login_handshake([1, 2, 3, 4], 7, "secret");

    let config = Arc::new(tibia_integration_tests::test_proxy_config(
        Arc::new(Registry::empty()),
        "Proxy",
        "configured banner",
        0x0100_007F,
        7172,
    ));

    let (client_stream, mut client_peer) = tokio::io::duplex(4096);
    let (backend_stream, mut backend_peer) = tokio::io::duplex(4096);

    let driver = tokio::spawn(async move {
        tibia_transport::write_message(&mut client_peer, &handshake_bytes, None)
            .await
            .unwrap();

        let _forwarded_handshake = tibia_transport::read_message(&mut backend_peer, None)
            .await
            .unwrap();

        let backend_reply = LoginResult {
            disconnect_reason: None,
            motd: Some(Motd {
                id: "old_id".into(),
                message: "old".into(),
            }),
            character_list: Some(CharacterList {
                characters: vec![CharacterEntry {
                    name: "Hero".into(),
                    world_name: "RealWorld".into(),
                    world_ip: 0x0100_007F,
                    world_port: 7172,
                }],
                premium_days: 0,
            }),
        };
        let mut w = ByteWriter::new();
        login::encode_login_result(&mut w, &backend_reply);
        let bytes = w.finish().unwrap();
        tibia_transport::write_message(&mut backend_peer, &bytes, None)
            .await
            .unwrap();

        let reply_bytes = tibia_transport::read_message(&mut client_peer, None)
            .await
            .unwrap();
        let mut r = ByteReader::new(&reply_bytes);
        login::parse_login_result(&mut r).unwrap()
    });

    tibia_session::run_login_session(client_stream, config, || async move { Ok(backend_stream) })
        .await
        .unwrap();

    let rewritten = driver.await.unwrap();
    let entry = &rewritten.character_list.unwrap().characters[0];
    assert_eq!(entry.name, "Hero");
    assert_eq!(entry.world_name, "Proxy");
    assert_eq!(entry.world_ip, 0x0100_007F);
    assert_eq!(entry.world_port, 7172);

    let motd = rewritten.motd.unwrap();
    assert_eq!(motd.message, "configured banner");
    assert_ne!(motd.id, "old_id");
}
