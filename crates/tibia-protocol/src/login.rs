//! Login-portal messages: the handshake envelope (unencrypted header plus
//! an opaque RSA-encrypted tail the crypto layer handles) and the composite
//! reply frame a real server sends back (MOTD, character list, disconnect
//! reason, concatenated opcodes inside one XTEA frame).

use tibia_codec::{ByteReader, ByteWriter};

use crate::error::{ProtocolError, Result};
use crate::opcodes::login as opcode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Motd {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterEntry {
    pub name: String,
    pub world_name: String,
    pub world_ip: u32,
    pub world_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterList {
    pub characters: Vec<CharacterEntry>,
    pub premium_days: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginResult {
    pub disconnect_reason: Option<String>,
    pub motd: Option<Motd>,
    pub character_list: Option<CharacterList>,
}

/// Parses every opcode concatenated in a login-portal reply frame. Mirrors
/// the original's loop-until-exhausted reader: each sub-message is one
/// opcode byte followed by its own payload, repeated until the frame ends.
pub fn parse_login_result(r: &mut ByteReader<'_>) -> Result<LoginResult> {
    let mut result = LoginResult::default();

    while r.remaining() > 0 {
        let op = r.read_u8();
        match op {
            opcode::DISCONNECT_REASON => {
                result.disconnect_reason = Some(r.read_string());
            }
            opcode::MOTD => {
                result.motd = Some(parse_motd(r)?);
            }
            opcode::PING => {}
            opcode::CHARACTER_LIST => {
                result.character_list = Some(parse_character_list(r));
            }
            other => return Err(ProtocolError::UnknownOpcode(other)),
        }
        if let Some(e) = r.err() {
            return Err(ProtocolError::Malformed(e));
        }
    }

    Ok(result)
}

pub fn encode_login_result(w: &mut ByteWriter, result: &LoginResult) {
    if let Some(reason) = &result.disconnect_reason {
        w.write_u8(opcode::DISCONNECT_REASON);
        w.write_string(reason);
    }
    if let Some(motd) = &result.motd {
        w.write_u8(opcode::MOTD);
        w.write_string(&format!("{}\n{}", motd.id, motd.message));
    }
    if let Some(list) = &result.character_list {
        w.write_u8(opcode::CHARACTER_LIST);
        write_character_list(w, list);
    }
}

fn parse_motd(r: &mut ByteReader<'_>) -> Result<Motd> {
    let raw = r.read_string();
    let (id, message) = raw.split_once('\n').ok_or(ProtocolError::MalformedMotd)?;
    Ok(Motd {
        id: id.to_string(),
        message: message.to_string(),
    })
}

fn parse_character_list(r: &mut ByteReader<'_>) -> CharacterList {
    let count = r.read_u8();
    let mut characters = Vec::with_capacity(count as usize);
    for _ in 0..count {
        characters.push(CharacterEntry {
            name: r.read_string(),
            world_name: r.read_string(),
            world_ip: r.read_u32(),
            world_port: r.read_u16(),
        });
    }
    let premium_days = r.read_u16();
    CharacterList {
        characters,
        premium_days,
    }
}

fn write_character_list(w: &mut ByteWriter, list: &CharacterList) {
    w.write_u8(list.characters.len() as u8);
    for entry in &list.characters {
        w.write_string(&entry.name);
        w.write_string(&entry.world_name);
        w.write_u32(entry.world_ip);
        w.write_u16(entry.world_port);
    }
    w.write_u16(list.premium_days);
}

/// Unencrypted header shared by both portals' first client packet, plus the
/// still-encrypted RSA block. Crypto-layer work (decrypting/re-encrypting
/// that block) happens in the session crate, which owns the key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeEnvelope {
    pub protocol: u8,
    pub client_os: u16,
    pub client_version: u16,
    /// Present for the login portal only (`dat`, `spr`, `pic` signatures).
    pub client_signatures: Option<(u32, u32, u32)>,
    pub encrypted_block: Vec<u8>,
}

pub fn decode_login_envelope(r: &mut ByteReader<'_>) -> HandshakeEnvelope {
    let protocol = r.read_u8();
    let client_os = r.read_u16();
    let client_version = r.read_u16();
    let dat = r.read_u32();
    let spr = r.read_u32();
    let pic = r.read_u32();
    HandshakeEnvelope {
        protocol,
        client_os,
        client_version,
        client_signatures: Some((dat, spr, pic)),
        encrypted_block: r.take_remaining(),
    }
}

pub fn decode_game_envelope(r: &mut ByteReader<'_>) -> HandshakeEnvelope {
    let protocol = r.read_u8();
    let client_os = r.read_u16();
    let client_version = r.read_u16();
    HandshakeEnvelope {
        protocol,
        client_os,
        client_version,
        client_signatures: None,
        encrypted_block: r.take_remaining(),
    }
}

pub fn encode_envelope(w: &mut ByteWriter, envelope: &HandshakeEnvelope) {
    w.write_u8(envelope.protocol);
    w.write_u16(envelope.client_os);
    w.write_u16(envelope.client_version);
    if let Some((dat, spr, pic)) = envelope.client_signatures {
        w.write_u32(dat);
        w.write_u32(spr);
        w.write_u32(pic);
    }
    w.write_bytes(&envelope.encrypted_block);
}

/// The plaintext fields inside the login portal's RSA block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub check: u8,
    pub xtea_key: [u32; 4],
    pub account_number: u32,
    pub password: String,
}

pub fn decode_login_credentials(r: &mut ByteReader<'_>) -> LoginCredentials {
    LoginCredentials {
        check: r.read_u8(),
        xtea_key: [r.read_u32(), r.read_u32(), r.read_u32(), r.read_u32()],
        account_number: r.read_u32(),
        password: r.read_string(),
    }
}

pub fn encode_login_credentials(w: &mut ByteWriter, c: &LoginCredentials) {
    w.write_u8(c.check);
    for word in c.xtea_key {
        w.write_u32(word);
    }
    w.write_u32(c.account_number);
    w.write_string(&c.password);
}

/// The plaintext fields inside the game portal's RSA block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCredentials {
    pub check: u8,
    pub xtea_key: [u32; 4],
    pub gamemaster: bool,
    pub account_number: u32,
    pub character_name: String,
    pub password: String,
}

pub fn decode_game_credentials(r: &mut ByteReader<'_>) -> GameCredentials {
    GameCredentials {
        check: r.read_u8(),
        xtea_key: [r.read_u32(), r.read_u32(), r.read_u32(), r.read_u32()],
        gamemaster: r.read_bool(),
        account_number: r.read_u32(),
        character_name: r.read_string(),
        password: r.read_string(),
    }
}

pub fn encode_game_credentials(w: &mut ByteWriter, c: &GameCredentials) {
    w.write_u8(c.check);
    for word in c.xtea_key {
        w.write_u32(word);
    }
    w.write_bool(c.gamemaster);
    w.write_u32(c.account_number);
    w.write_string(&c.character_name);
    w.write_string(&c.password);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_result_roundtrips_through_encode() {
        let result = LoginResult {
            disconnect_reason: None,
            motd: Some(Motd {
                id: "1234".into(),
                message: "hello".into(),
            }),
            character_list: Some(CharacterList {
                characters: vec![CharacterEntry {
                    name: "Hero".into(),
                    world_name: "RealWorld".into(),
                    world_ip: 0x0100007F,
                    world_port: 7172,
                }],
                premium_days: 0,
            }),
        };

        let mut w = ByteWriter::new();
        encode_login_result(&mut w, &result);
        let bytes = w.finish().unwrap();

        let mut r = ByteReader::new(&bytes);
        let parsed = parse_login_result(&mut r).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn motd_without_separator_is_malformed() {
        let mut w = ByteWriter::new();
        w.write_u8(opcode::MOTD);
        w.write_string("no-separator-here");
        let bytes = w.finish().unwrap();

        let mut r = ByteReader::new(&bytes);
        assert!(matches!(
            parse_login_result(&mut r),
            Err(ProtocolError::MalformedMotd)
        ));
    }

    #[test]
    fn login_credentials_roundtrip() {
        let creds = LoginCredentials {
            check: 0,
            xtea_key: [1, 2, 3, 4],
            account_number: 999,
            password: "secret".into(),
        };
        let mut w = ByteWriter::new();
        encode_login_credentials(&mut w, &creds);
        let bytes = w.finish().unwrap();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(decode_login_credentials(&mut r), creds);
    }
}
