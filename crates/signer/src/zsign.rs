//! zsign child-process invocation.

use crate::error::{SignerError, SignerResult};
use emboss_core::SignParams;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Handle to the external zsign executable.
pub struct ZsignTool {
    program: PathBuf,
}

/// One signing invocation: the three input paths, the output path, and the
/// pass-through parameters.
pub struct SignJob<'a> {
    /// Application archive to resign.
    pub package: &'a Path,
    /// PKCS#12 certificate container.
    pub certificate: &'a Path,
    /// Provisioning profile.
    pub profile: &'a Path,
    /// Path the tool must write the resigned package to.
    pub output: &'a Path,
    /// Optional password and bundle identifier, passed through verbatim.
    pub params: &'a SignParams,
}

/// Result of a successful signing invocation.
#[derive(Debug)]
pub struct SignOutcome {
    /// Path of the produced artifact.
    pub output: PathBuf,
    /// Size of the produced artifact in bytes.
    pub size: u64,
    /// Captured stdout of the tool.
    pub stdout: String,
}

impl ZsignTool {
    /// Create a handle for the executable at `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Path of the executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Resign a package.
    ///
    /// Arguments are passed as an explicit vector, never through a shell, so
    /// user-supplied passwords and bundle identifiers cannot inject commands.
    /// On nonzero exit the tool's combined diagnostic output is returned
    /// verbatim; it is opaque to this system.
    pub async fn sign(&self, job: &SignJob<'_>) -> SignerResult<SignOutcome> {
        let mut command = Command::new(&self.program);
        command.arg("-k").arg(job.certificate);
        if let Some(password) = &job.params.password {
            command.arg("-p").arg(password);
        }
        command.arg("-m").arg(job.profile);
        if let Some(bundle_id) = &job.params.bundle_id {
            command.arg("-b").arg(bundle_id);
        }
        command.arg("-o").arg(job.output);
        command.arg(job.package);
        command.stdin(Stdio::null());

        tracing::debug!(
            tool = %self.program.display(),
            package = %job.package.display(),
            output = %job.output.display(),
            "invoking signing tool"
        );

        let output = command.output().await.map_err(|e| SignerError::Launch {
            tool: self.program.display().to_string(),
            source: e,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(SignerError::ToolFailed {
                status: output.status.to_string(),
                diagnostics: combine_diagnostics(&stdout, &stderr),
            });
        }

        // Exit 0 alone is not trusted; the output file is the confirmation.
        let metadata =
            tokio::fs::metadata(job.output)
                .await
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => {
                        SignerError::MissingOutput(job.output.to_path_buf())
                    }
                    _ => SignerError::Io(e),
                })?;

        Ok(SignOutcome {
            output: job.output.to_path_buf(),
            size: metadata.len(),
            stdout,
        })
    }

    /// Probe the tool's availability, returning its reported version string.
    pub async fn version(&self) -> SignerResult<String> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SignerError::Launch {
                tool: self.program.display().to_string(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(SignerError::ToolFailed {
                status: output.status.to_string(),
                diagnostics: combine_diagnostics(&stdout, &stderr),
            });
        }

        // First non-empty line is the version banner; some builds print to stderr.
        let version = stdout
            .lines()
            .chain(stderr.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_string();

        Ok(version)
    }
}

/// Merge stdout and stderr into one opaque diagnostic blob, stderr first.
fn combine_diagnostics(stdout: &str, stderr: &str) -> String {
    match (stderr.trim(), stdout.trim()) {
        ("", "") => "signing tool produced no diagnostic output".to_string(),
        (err, "") => err.to_string(),
        ("", out) => out.to_string(),
        (err, out) => format!("{err}\n{out}"),
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable fake tool script into `dir`.
    fn fake_tool(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-zsign");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// Script that copies the trailing input argument to the -o argument.
    const COPYING_TOOL: &str = r#"
out=""
in=""
while [ $# -gt 0 ]; do
  case "$1" in
    --version) echo "fake-zsign 0.7"; exit 0 ;;
    -k|-p|-m|-b) shift ;;
    -o) out="$2"; shift ;;
    *) in="$1" ;;
  esac
  shift
done
cp "$in" "$out"
"#;

    fn job<'a>(
        package: &'a Path,
        certificate: &'a Path,
        profile: &'a Path,
        output: &'a Path,
        params: &'a SignParams,
    ) -> SignJob<'a> {
        SignJob {
            package,
            certificate,
            profile,
            output,
            params,
        }
    }

    #[tokio::test]
    async fn sign_success_confirms_output() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ZsignTool::new(fake_tool(dir.path(), COPYING_TOOL));

        let package = dir.path().join("app.ipa");
        let certificate = dir.path().join("cert.p12");
        let profile = dir.path().join("profile.mobileprovision");
        let output = dir.path().join("app_signed.ipa");
        std::fs::write(&package, b"package contents").unwrap();
        std::fs::write(&certificate, b"cert").unwrap();
        std::fs::write(&profile, b"profile").unwrap();

        let params = SignParams::default();
        let outcome = tool
            .sign(&job(&package, &certificate, &profile, &output, &params))
            .await
            .unwrap();

        assert_eq!(outcome.size, 16);
        assert_eq!(std::fs::read(&output).unwrap(), b"package contents");
    }

    #[tokio::test]
    async fn nonzero_exit_surfaces_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ZsignTool::new(fake_tool(
            dir.path(),
            "echo 'error: bad certificate' >&2; exit 1",
        ));

        let package = dir.path().join("app.ipa");
        std::fs::write(&package, b"x").unwrap();
        let params = SignParams::default();
        let err = tool
            .sign(&job(
                &package,
                &package,
                &package,
                &dir.path().join("out.ipa"),
                &params,
            ))
            .await
            .unwrap_err();

        match err {
            SignerError::ToolFailed {
                status,
                diagnostics,
            } => {
                assert!(diagnostics.contains("bad certificate"));
                assert!(status.contains('1'));
            }
            other => panic!("expected ToolFailed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn successful_exit_without_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ZsignTool::new(fake_tool(dir.path(), "exit 0"));

        let package = dir.path().join("app.ipa");
        std::fs::write(&package, b"x").unwrap();
        let output = dir.path().join("never_written.ipa");
        let params = SignParams::default();
        let err = tool
            .sign(&job(&package, &package, &package, &output, &params))
            .await
            .unwrap_err();

        assert!(matches!(err, SignerError::MissingOutput(p) if p == output));
    }

    #[tokio::test]
    async fn optional_flags_are_passed_as_separate_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("args.log");
        let tool = ZsignTool::new(fake_tool(
            dir.path(),
            &format!("printf '%s\\n' \"$@\" > {}\ntouch \"${{10}}\"", log.display()),
        ));

        let package = dir.path().join("app.ipa");
        std::fs::write(&package, b"x").unwrap();
        let output = dir.path().join("out.ipa");
        let params = SignParams {
            password: Some("s3cret; rm -rf /".to_string()),
            bundle_id: Some("com.example.app".to_string()),
        };
        tool.sign(&job(&package, &package, &package, &output, &params))
            .await
            .unwrap();

        let logged = std::fs::read_to_string(&log).unwrap();
        let args: Vec<&str> = logged.lines().collect();
        // -k <cert> -p <password> -m <profile> -b <bundleId> -o <output> <input>
        assert_eq!(args[2], "-p");
        assert_eq!(args[3], "s3cret; rm -rf /");
        assert_eq!(args[6], "-b");
        assert_eq!(args[7], "com.example.app");
    }

    #[tokio::test]
    async fn version_probe() {
        let dir = tempfile::tempdir().unwrap();
        let tool = ZsignTool::new(fake_tool(dir.path(), COPYING_TOOL));
        assert_eq!(tool.version().await.unwrap(), "fake-zsign 0.7");

        let missing = ZsignTool::new(dir.path().join("no-such-tool"));
        assert!(matches!(
            missing.version().await,
            Err(SignerError::Launch { .. })
        ));
    }
}
