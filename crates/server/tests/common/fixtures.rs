//! Multipart request fixtures.

use axum::body::Body;
use axum::http::Request;

/// Boundary used by all generated multipart bodies.
#[allow(dead_code)]
pub const BOUNDARY: &str = "EmbossTestBoundary";

/// Contents of the standard test package.
#[allow(dead_code)]
pub const PACKAGE_BYTES: &[u8] = b"fake ipa payload";

/// One part of a multipart body.
#[allow(dead_code)]
pub struct Part<'a> {
    pub field: &'a str,
    pub filename: Option<&'a str>,
    pub content: &'a [u8],
}

#[allow(dead_code)]
impl<'a> Part<'a> {
    pub fn file(field: &'a str, filename: &'a str, content: &'a [u8]) -> Self {
        Self {
            field,
            filename: Some(filename),
            content,
        }
    }

    pub fn text(field: &'a str, content: &'a str) -> Self {
        Self {
            field,
            filename: None,
            content: content.as_bytes(),
        }
    }
}

/// Encode parts as a multipart/form-data body.
#[allow(dead_code)]
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.field, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                    part.field
                )
                .as_bytes(),
            ),
        }
        body.extend_from_slice(part.content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Build a POST /api/sign request from parts.
#[allow(dead_code)]
pub fn sign_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/sign")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

/// The three required file parts with valid extensions.
#[allow(dead_code)]
pub fn standard_parts() -> Vec<Part<'static>> {
    vec![
        Part::file("ipa", "MyApp.ipa", PACKAGE_BYTES),
        Part::file("certificate", "cert.p12", b"certificate bytes"),
        Part::file("provision", "profile.mobileprovision", b"profile bytes"),
    ]
}
