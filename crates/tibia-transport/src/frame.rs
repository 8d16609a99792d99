use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use tibia_crypto::{xtea_decrypt, xtea_encrypt};

use crate::error::{Result, TransportError};

/// Reads one framed message: a 2-byte little-endian length prefix followed
/// by that many bytes. If `xtea` is set, the frame body is decrypted and
/// its own 2-byte inner length strips the XTEA zero padding.
pub async fn read_message<R: AsyncRead + Unpin>(
    reader: &mut R,
    xtea: Option<[u32; 4]>,
) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 2];
    reader.read_exact(&mut len_buf).await?;
    let frame_len = u16::from_le_bytes(len_buf) as usize;

    let mut payload = vec![0u8; frame_len];
    reader.read_exact(&mut payload).await?;

    let Some(key) = xtea else {
        return Ok(payload);
    };

    let plaintext = xtea_decrypt(&payload, key)?;
    if plaintext.len() < 2 {
        return Err(TransportError::ShortPlaintext);
    }
    let inner_len = u16::from_le_bytes([plaintext[0], plaintext[1]]) as usize;
    if inner_len + 2 > plaintext.len() {
        return Err(TransportError::MalformedPacket {
            inner_len,
            available: plaintext.len(),
        });
    }
    Ok(plaintext[2..2 + inner_len].to_vec())
}

/// Writes one framed message, mirroring [`read_message`]'s wire shape.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
    xtea: Option<[u32; 4]>,
) -> Result<()> {
    let frame_body = match xtea {
        None => payload.to_vec(),
        Some(key) => {
            let mut inner = Vec::with_capacity(2 + payload.len());
            inner.extend_from_slice(&(payload.len() as u16).to_le_bytes());
            inner.extend_from_slice(payload);
            xtea_encrypt(&inner, key)
        }
    };

    let frame_len = frame_body.len() as u16;
    writer.write_all(&frame_len.to_le_bytes()).await?;
    writer.write_all(&frame_body).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrip_without_xtea() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_message(&mut client, b"hello", None).await.unwrap();
        let got = read_message(&mut server, None).await.unwrap();
        assert_eq!(got, b"hello");
    }

    #[tokio::test]
    async fn roundtrip_with_xtea() {
        let key = [0x1111_1111, 0x2222_2222, 0x3333_3333, 0x4444_4444];
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_message(&mut client, b"secret payload", Some(key))
            .await
            .unwrap();
        let got = read_message(&mut server, Some(key)).await.unwrap();
        assert_eq!(got, b"secret payload");
    }

    #[tokio::test]
    async fn empty_payload_roundtrips() {
        let key = [1, 2, 3, 4];
        let (mut client, mut server) = tokio::io::duplex(64);
        write_message(&mut client, &[], Some(key)).await.unwrap();
        let got = read_message(&mut server, Some(key)).await.unwrap();
        assert!(got.is_empty());
    }
}
