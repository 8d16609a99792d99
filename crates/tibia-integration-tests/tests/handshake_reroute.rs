//! Scenario 1: a client sends a canned credentials frame; the proxy
//! decrypts it with its own key, dials a captive backend, and the backend
//! sees the re-encrypted frame decrypt to the same plaintext fields.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use tibia_assets::Registry;
use tibia_codec::ByteReader;
use tibia_protocol::login;

#[tokio::test]
async fn game_handshake_reroutes_with_identical_plaintext_fields() {
    let xtea_key = [0x1111_1111, 0x2222_2222, 0x3333_3333, 0x4444_4444];
    let handshake_bytes =
        tibia_integration_tests::build_game_handshake(xtea_key, 7, "secret");

    let config = Arc::new(tibia_integration_tests::test_proxy_config(
        Arc::new(Registry::empty()),
        "Proxied",
        "welcome",
        0x0100_007F,
        7172,
    ));

    let (client_stream, mut client_peer) = tokio::io::duplex(4096);
    let (backend_stream, mut backend_peer) = tokio::io::duplex(4096);

    let captive_backend = tokio::spawn(async move {
        tibia_transport::write_message(&mut client_peer, &handshake_bytes, None)
            .await
            .unwrap();

        let forwarded = tibia_transport::read_message(&mut backend_peer, None)
            .await
            .unwrap();

        let (priv_key, _) = tibia_integration_tests::toy_keypair();
        let mut r = ByteReader::new(&forwarded);
        let envelope = login::decode_game_envelope(&mut r);
        assert!(r.is_ok());

        let plaintext = priv_key.decrypt(&envelope.encrypted_block);
        let mut cr = ByteReader::new(&plaintext);
        let creds = login::decode_game_credentials(&mut cr);

        assert_eq!(creds.check, 0);
        assert_eq!(creds.xtea_key, xtea_key);
        assert_eq!(creds.account_number, 7);
        assert_eq!(creds.password, "secret");
    });

    let session = tibia_session::run_game_session(client_stream, config, Vec::new(), || async move {
        Ok(backend_stream)
    });

    // The captive backend never replies, so the session hangs reading the
    // post-handshake game stream; only the handshake forwarding under test
    // needs to complete. Race it against the assertions task instead of
    // awaiting the session to completion.
    tokio::select! {
        result = captive_backend => result.unwrap(),
        _ = session => panic!("session ended before the captive backend finished its assertions"),
    }
}
