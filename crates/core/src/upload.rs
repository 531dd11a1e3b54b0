//! Upload kinds and signing parameters.

use crate::error::{Error, Result};

/// The three file kinds a signing request must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UploadKind {
    /// The application archive being resigned.
    Package,
    /// The PKCS#12 certificate container authorizing the signature.
    Certificate,
    /// The provisioning profile paired with the certificate.
    Profile,
}

impl UploadKind {
    /// All kinds, in the order the signing tool consumes them.
    pub const ALL: [UploadKind; 3] = [
        UploadKind::Package,
        UploadKind::Certificate,
        UploadKind::Profile,
    ];

    /// Multipart field name carrying this kind.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Package => "ipa",
            Self::Certificate => "certificate",
            Self::Profile => "provision",
        }
    }

    /// The single permitted file extension for this kind.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Package => "ipa",
            Self::Certificate => "p12",
            Self::Profile => "mobileprovision",
        }
    }

    /// Stable file name under which this kind is stashed in a session directory.
    pub fn stored_name(self) -> &'static str {
        match self {
            Self::Package => "app.ipa",
            Self::Certificate => "cert.p12",
            Self::Profile => "profile.mobileprovision",
        }
    }

    /// Resolve a multipart field name to an upload kind.
    pub fn from_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.field_name() == name)
    }

    /// Check a client-supplied file name against the permitted extension.
    ///
    /// Extensions are compared case-insensitively; a bare name with no
    /// extension never matches.
    pub fn check_filename(self, filename: &str) -> Result<()> {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        if ext.eq_ignore_ascii_case(self.extension()) {
            Ok(())
        } else {
            Err(Error::UnsupportedFileType {
                field: self.field_name(),
                expected: self.extension(),
            })
        }
    }
}

/// Optional parameters passed through verbatim to the signing tool.
///
/// The credential password is never persisted beyond the tool invocation.
#[derive(Clone, Debug, Default)]
pub struct SignParams {
    /// Password unlocking the certificate container.
    pub password: Option<String>,
    /// Replacement bundle identifier for the resigned package.
    pub bundle_id: Option<String>,
}
