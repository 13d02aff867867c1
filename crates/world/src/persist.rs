//! Profile save files.
//!
//! A save file is a fixed 14-byte header followed by the versioned JSON
//! profile record. The header carries a magic number, the container format
//! version, a CRC32 of the payload and the payload length, so truncated or
//! bit-flipped files are caught before the JSON is parsed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crc32fast::Hasher;
use tracing::{info, warn};

use crate::{PlayerProfile, ProfileError};

/// Magic number for save files ("TWSV").
const SAVE_MAGIC: u32 = 0x5457_5356;

/// Current container format version.
const SAVE_FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 14;

/// Save file header structure.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SaveHeader {
    magic: u32,
    version: u16,
    crc32: u32,
    payload_len: u32,
}

impl SaveHeader {
    fn new(crc32: u32, payload_len: u32) -> Self {
        Self {
            magic: SAVE_MAGIC,
            version: SAVE_FORMAT_VERSION,
            crc32,
            payload_len,
        }
    }

    fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..10].copy_from_slice(&self.crc32.to_le_bytes());
        bytes[10..14].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, ProfileError> {
        if bytes.len() < HEADER_LEN {
            return Err(ProfileError::Corrupt("save header too short".into()));
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != SAVE_MAGIC {
            return Err(ProfileError::Corrupt(format!(
                "invalid save magic: expected 0x{SAVE_MAGIC:08X}, got 0x{magic:08X}"
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != SAVE_FORMAT_VERSION {
            return Err(ProfileError::UnsupportedVersion {
                found: u64::from(version),
                expected: u32::from(SAVE_FORMAT_VERSION),
            });
        }
        let crc32 = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let payload_len = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);

        Ok(Self {
            magic,
            version,
            crc32,
            payload_len,
        })
    }
}

/// Encode a profile into save-file bytes.
pub fn encode_save(profile: &PlayerProfile) -> Result<Vec<u8>> {
    let payload = profile
        .to_save_string()
        .context("Failed to serialize profile")?
        .into_bytes();
    let payload_len = u32::try_from(payload.len()).context("Profile save too large")?;

    let mut hasher = Hasher::new();
    hasher.update(&payload);
    let header = SaveHeader::new(hasher.finalize(), payload_len);

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode save-file bytes, validating the header before parsing.
pub fn decode_save(bytes: &[u8]) -> Result<PlayerProfile, ProfileError> {
    let header = SaveHeader::from_bytes(bytes)?;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() != header.payload_len as usize {
        return Err(ProfileError::Corrupt(format!(
            "payload length mismatch: header says {}, file has {}",
            header.payload_len,
            payload.len()
        )));
    }

    let mut hasher = Hasher::new();
    hasher.update(payload);
    let crc32 = hasher.finalize();
    if crc32 != header.crc32 {
        return Err(ProfileError::Corrupt(format!(
            "CRC mismatch: expected 0x{:08X}, got 0x{crc32:08X}",
            header.crc32
        )));
    }

    let text = std::str::from_utf8(payload)
        .map_err(|err| ProfileError::Corrupt(format!("payload is not UTF-8: {err}")))?;
    PlayerProfile::from_save_str(text)
}

/// Directory of named profile saves.
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create save directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the save file for `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.twsave"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    /// Write a profile. The file is replaced atomically via a temp file.
    pub fn save(&self, name: &str, profile: &PlayerProfile) -> Result<PathBuf> {
        let path = self.path_for(name);
        let tmp = path.with_extension("twsave.tmp");
        let bytes = encode_save(profile)?;
        fs::write(&tmp, &bytes)
            .with_context(|| format!("Failed to write save file {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move save into place at {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "profile saved");
        Ok(path)
    }

    /// Read a profile back.
    pub fn load(&self, name: &str) -> Result<PlayerProfile, ProfileError> {
        let path = self.path_for(name);
        let bytes = fs::read(&path)?;
        decode_save(&bytes).inspect_err(|err| {
            warn!(path = %path.display(), error = %err, "failed to load profile");
        })
    }
}
