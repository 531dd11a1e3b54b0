//! OTA install manifest generation.
//!
//! Builds the Apple over-the-air installation descriptor: an XML property
//! list with a single `software-package` asset pointing at a produced
//! artifact. Devices fetch it through an `itms-services://` install-trigger
//! URL and require the `application/xml` media type to honor it.

/// Media type required for OTA manifests.
pub const MEDIA_TYPE: &str = "application/xml";

/// Placeholder bundle identifier used when no real metadata is available.
const DEFAULT_BUNDLE_ID: &str = "com.emboss.resigned";

/// Placeholder bundle version used when no real metadata is available.
const DEFAULT_BUNDLE_VERSION: &str = "1.0.0";

/// An OTA install descriptor for one software package.
#[derive(Clone, Debug)]
pub struct InstallManifest {
    /// Direct-download URL of the package asset.
    pub package_url: String,
    /// Bundle identifier advertised to the installing device.
    pub bundle_id: String,
    /// Bundle version advertised to the installing device.
    pub bundle_version: String,
    /// Human-readable title shown in the install prompt.
    pub title: String,
}

impl InstallManifest {
    /// Build a manifest for a produced artifact with generic metadata.
    ///
    /// The bundle identifier and version are placeholders; they are not
    /// derived from the signed package itself.
    pub fn for_artifact(package_url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            package_url: package_url.into(),
            bundle_id: DEFAULT_BUNDLE_ID.to_string(),
            bundle_version: DEFAULT_BUNDLE_VERSION.to_string(),
            title: title.into(),
        }
    }

    /// Render the manifest as an XML property list document.
    pub fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>items</key>
    <array>
        <dict>
            <key>assets</key>
            <array>
                <dict>
                    <key>kind</key>
                    <string>software-package</string>
                    <key>url</key>
                    <string>{url}</string>
                </dict>
            </array>
            <key>metadata</key>
            <dict>
                <key>bundle-identifier</key>
                <string>{bundle_id}</string>
                <key>bundle-version</key>
                <string>{bundle_version}</string>
                <key>kind</key>
                <string>software</string>
                <key>title</key>
                <string>{title}</string>
            </dict>
        </dict>
    </array>
</dict>
</plist>
"#,
            url = xml_escape(&self.package_url),
            bundle_id = xml_escape(&self.bundle_id),
            bundle_version = xml_escape(&self.bundle_version),
            title = xml_escape(&self.title),
        )
    }
}

/// Escape XML special characters in text content.
fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
