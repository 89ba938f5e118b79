use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::Sha256;
use thiserror::Error;

const PRIVATE_KEY_FILE: &str = "private-key.pem";
const CERTIFICATE_FILE: &str = "certificate.pem";

/// Key id advertised in the signature header.
const KEY_ID: &str = "main";

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("private key not found at {0} (generate a signing key pair first)")]
    KeyNotFound(PathBuf),
    #[error("certificate not found at {0} (generate a signing key pair first)")]
    CertificateNotFound(PathBuf),
    #[error("failed to parse private key: {0}")]
    InvalidKey(#[from] rsa::pkcs8::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Holds the manifest signing key and certificate chain for the lifetime of
/// the process. Constructed once at startup; a missing key or certificate is
/// a fatal configuration error, never silently defaulted.
pub struct ManifestSigner {
    signing_key: SigningKey<Sha256>,
    certificate_pem: String,
}

impl ManifestSigner {
    /// Load `private-key.pem` (PKCS#8 RSA) and `certificate.pem` from the
    /// keys directory.
    pub fn load(keys_dir: &Path) -> Result<Self, SignerError> {
        let key_path = keys_dir.join(PRIVATE_KEY_FILE);
        if !key_path.exists() {
            return Err(SignerError::KeyNotFound(key_path));
        }
        let cert_path = keys_dir.join(CERTIFICATE_FILE);
        if !cert_path.exists() {
            return Err(SignerError::CertificateNotFound(cert_path));
        }

        let key_pem = fs::read_to_string(&key_path)?;
        let private_key = RsaPrivateKey::from_pkcs8_pem(&key_pem)?;
        let certificate_pem = fs::read_to_string(&cert_path)?;

        Ok(Self {
            signing_key: SigningKey::new(private_key),
            certificate_pem,
        })
    }

    /// Sign the exact bytes that will be sent to the client
    /// (RSASSA-PKCS1-v1_5 over SHA-256), base64-encoded.
    ///
    /// The manifest must be signed in the same byte form it is transmitted;
    /// re-serializing after signing would invalidate the signature.
    pub fn sign(&self, manifest_bytes: &[u8]) -> String {
        let signature = self.signing_key.sign(manifest_bytes);
        BASE64.encode(signature.to_bytes())
    }

    /// Render the structured signature header value.
    pub fn signature_header(&self, signature: &str) -> String {
        format!("sig=\"{signature}\", keyid=\"{KEY_ID}\", alg=\"rsa-v1_5-sha256\"")
    }

    /// The certificate chain as loaded (PEM text).
    pub fn certificate_chain(&self) -> &str {
        &self.certificate_pem
    }

    /// The certificate chain folded onto a single line. Transport metadata
    /// fields cannot carry embedded newlines.
    pub fn certificate_chain_header(&self) -> String {
        self.certificate_pem
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
