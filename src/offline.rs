use md5::{Digest, Md5};
use uuid::Uuid;

/// Derive the deterministic offline-player UUID for a username.
///
/// This is the identifier the game protocol assigns to players on servers
/// running without online authentication: the MD5 digest of
/// `"OfflinePlayer:" + username` with the RFC 4122 version-3 and variant
/// bits patched in. Bit-exact compatibility with other launchers and
/// servers is required, so the transform must not change.
///
/// See <https://wiki.vg/Protocol#Spawn_Player>.
pub fn offline_uuid(username: &str) -> Uuid {
    let mut hasher = Md5::new();
    hasher.update(format!("OfflinePlayer:{username}").as_bytes());
    let mut bytes: [u8; 16] = hasher.finalize().into();

    // Version 3 (name-based, MD5) in byte 6, variant 10 in byte 8.
    bytes[6] = (bytes[6] & 0x0F) | 0x30;
    bytes[8] = (bytes[8] & 0x3F) | 0x80;

    Uuid::from_bytes(bytes)
}
