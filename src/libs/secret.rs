//! Encrypted at-rest storage for small secrets such as the auth session.
//!
//! Values are encrypted with AES-256-CBC using the key and IV embedded at
//! build time, then base64-encoded into a file in the data directory.

use super::data_storage::DataStorage;
use aes::Aes256;
use anyhow::Result;
use base64::prelude::*;
use block_modes::block_padding::Pkcs7;
use block_modes::{BlockMode, Cbc};
use dialoguer::{theme::ColorfulTheme, Password};
use std::fs;
use std::path::{Path, PathBuf};

include!(concat!(env!("OUT_DIR"), "/app_metadata.rs"));

type Aes256Cbc = Cbc<Aes256, Pkcs7>;

#[derive(Clone, Debug)]
pub struct Secret {
    path: PathBuf,
    key: Vec<u8>,
    iv: Vec<u8>,
}

impl Secret {
    /// A secret stored as `file_name` in the data directory.
    pub fn new(file_name: &str) -> Self {
        let path = DataStorage::new().get_path(file_name).unwrap_or_else(|_| PathBuf::from(file_name));
        Self::at(path)
    }

    /// A secret stored at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: APP_METADATA_ENCRYPTION_KEY.to_vec(),
            iv: APP_METADATA_ENCRYPTION_IV.to_vec(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn store(&self, plaintext: &str) -> Result<()> {
        let cipher = Aes256Cbc::new_from_slices(&self.key, &self.iv)?;
        let ciphertext = cipher.encrypt_vec(plaintext.as_bytes());
        let encoded = BASE64_STANDARD.encode(ciphertext);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, encoded)?;
        Ok(())
    }

    pub fn load(&self) -> Result<String> {
        let encoded = fs::read_to_string(&self.path)?;
        let ciphertext = BASE64_STANDARD.decode(encoded.trim())?;
        let cipher = Aes256Cbc::new_from_slices(&self.key, &self.iv)?;
        let plaintext = cipher.decrypt_vec(&ciphertext)?;
        Ok(String::from_utf8(plaintext)?)
    }

    /// Removes the stored value; a missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Asks for a password on the terminal without echoing it.
    pub fn prompt(prompt: &str) -> Result<String> {
        Ok(Password::with_theme(&ColorfulTheme::default()).with_prompt(prompt).interact()?)
    }

    /// Asks for a new password twice and requires both to match.
    pub fn prompt_new(prompt: &str) -> Result<String> {
        Ok(Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .with_confirmation("Repeat password", "Passwords do not match")
            .interact()?)
    }
}
