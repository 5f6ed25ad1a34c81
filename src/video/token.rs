//! Room token, vendor format version 04 (AES-256-GCM mode).
//!
//! Layout before base64, all integers big-endian:
//! `[expire: i64][nonce_len: u16][nonce][cipher_len: u16][ciphertext+tag][mode: u8 = 1]`
//! The token string is `"04"` followed by the standard base64 of that layout.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{RoomGrant, VideoError, VideoRooms};

const TOKEN_VERSION: &str = "04";
const NONCE_LENGTH: usize = 12;
const SECRET_LENGTH: usize = 32;
const MODE_GCM: u8 = 1;

/// Claims sealed inside a room token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    pub app_id: u32,
    pub user_id: String,
    pub nonce: i32,
    pub ctime: i64,
    pub expire: i64,
    pub payload: String,
}

pub struct ZegoTokenIssuer {
    app_id: u32,
    secret: [u8; SECRET_LENGTH],
    ttl_secs: i64,
}

impl ZegoTokenIssuer {
    pub fn new(app_id: u32, server_secret: &str, ttl_secs: i64) -> Result<Self, VideoError> {
        let bytes = server_secret.as_bytes();
        let secret: [u8; SECRET_LENGTH] = bytes
            .try_into()
            .map_err(|_| VideoError::InvalidSecret(bytes.len()))?;
        Ok(Self {
            app_id,
            secret,
            ttl_secs,
        })
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.secret))
    }

    /// Seal `claims` into a token string.
    pub fn seal(&self, claims: &TokenClaims) -> Result<String, VideoError> {
        let plaintext = serde_json::to_vec(claims).map_err(|_| VideoError::Signing)?;
        let nonce_bytes: [u8; NONCE_LENGTH] = rand::random();
        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_ref())
            .map_err(|_| VideoError::Signing)?;

        let mut buf = Vec::with_capacity(8 + 2 + NONCE_LENGTH + 2 + ciphertext.len() + 1);
        buf.extend_from_slice(&claims.expire.to_be_bytes());
        buf.extend_from_slice(&(NONCE_LENGTH as u16).to_be_bytes());
        buf.extend_from_slice(&nonce_bytes);
        buf.extend_from_slice(&(ciphertext.len() as u16).to_be_bytes());
        buf.extend_from_slice(&ciphertext);
        buf.push(MODE_GCM);

        Ok(format!(
            "{TOKEN_VERSION}{}",
            base64::engine::general_purpose::STANDARD.encode(buf)
        ))
    }

    /// Open a token produced by `seal` with the same secret.
    pub fn open(&self, token: &str) -> Result<TokenClaims, VideoError> {
        let encoded = token
            .strip_prefix(TOKEN_VERSION)
            .ok_or(VideoError::MalformedToken)?;
        let buf = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| VideoError::MalformedToken)?;

        let mut reader = Reader { buf: &buf, pos: 0 };
        let _expire = reader.take(8)?;
        let nonce_len = reader.u16()? as usize;
        let nonce = reader.take(nonce_len)?;
        let cipher_len = reader.u16()? as usize;
        let ciphertext = reader.take(cipher_len)?;
        if reader.take(1)?[0] != MODE_GCM || nonce_len != NONCE_LENGTH {
            return Err(VideoError::MalformedToken);
        }

        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| VideoError::MalformedToken)?;
        serde_json::from_slice(&plaintext).map_err(|_| VideoError::MalformedToken)
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], VideoError> {
        let end = self.pos.checked_add(n).ok_or(VideoError::MalformedToken)?;
        let slice = self.buf.get(self.pos..end).ok_or(VideoError::MalformedToken)?;
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, VideoError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }
}

/// Room-scoped payload restricting the token to one room.
fn room_payload(room_id: &str) -> String {
    serde_json::json!({
        "room_id": room_id,
        // 1 = room login, 2 = stream publish
        "privilege": { "1": 1, "2": 1 },
        "stream_id_list": null,
    })
    .to_string()
}

impl VideoRooms for ZegoTokenIssuer {
    fn grant(&self, room_id: &str, user_id: &str) -> Result<RoomGrant, VideoError> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            app_id: self.app_id,
            user_id: user_id.to_string(),
            nonce: rand::random(),
            ctime: now,
            expire: now + self.ttl_secs,
            payload: room_payload(room_id),
        };
        let token = self.seal(&claims)?;
        let expires_at = Utc
            .timestamp_opt(claims.expire, 0)
            .single()
            .ok_or(VideoError::Signing)?;

        tracing::debug!(room_id, user_id, "room token issued");

        Ok(RoomGrant {
            app_id: self.app_id,
            room_id: room_id.to_string(),
            token,
            expires_at,
        })
    }
}
