//! Server test utilities.

use emboss_core::AppConfig;
use emboss_server::{AppState, create_router};
use emboss_signer::ZsignTool;
use emboss_storage::{ArtifactStore, FilesystemArtifacts, SessionStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// How the fake signing tool behaves.
#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
pub enum FakeTool {
    /// Copies the input package to the output path, like a successful sign.
    Succeeding,
    /// Exits 1 with diagnostics on stderr.
    Failing,
    /// Points at an executable that does not exist.
    Missing,
}

/// Script that answers --version and otherwise copies input to output,
/// logging each signing invocation's arguments.
const SUCCEEDING_TOOL: &str = r#"#!/bin/sh
dir=$(dirname "$0")
case "$1" in
  --version) echo "fake-zsign 0.7"; exit 0 ;;
esac
echo "$@" >> "$dir/invocations.log"
out=""
in=""
while [ $# -gt 0 ]; do
  case "$1" in
    -k|-p|-m|-b) shift ;;
    -o) out="$2"; shift ;;
    *) in="$1" ;;
  esac
  shift
done
cp "$in" "$out"
"#;

/// Script that fails every signing invocation with stderr diagnostics.
const FAILING_TOOL: &str = r#"#!/bin/sh
dir=$(dirname "$0")
case "$1" in
  --version) echo "fake-zsign 0.7"; exit 0 ;;
esac
echo "$@" >> "$dir/invocations.log"
echo "error: bad certificate chain" >&2
exit 1
"#;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server with a succeeding fake tool.
    pub async fn new() -> Self {
        Self::with_tool(FakeTool::Succeeding, |_| {}).await
    }

    /// Create a test server with the given tool behavior and config tweaks.
    pub async fn with_tool<F>(tool: FakeTool, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let tool_path = match tool {
            FakeTool::Succeeding => write_fake_tool(temp_dir.path(), SUCCEEDING_TOOL),
            FakeTool::Failing => write_fake_tool(temp_dir.path(), FAILING_TOOL),
            FakeTool::Missing => temp_dir.path().join("missing-zsign"),
        };

        let mut config = AppConfig::for_testing();
        config.storage.upload_dir = temp_dir.path().join("uploads");
        config.storage.output_dir = temp_dir.path().join("output");
        config.signer.zsign_path = tool_path;
        modifier(&mut config);

        let sessions = Arc::new(
            SessionStore::new(&config.storage.upload_dir)
                .await
                .expect("Failed to create session store"),
        );
        let artifacts: Arc<dyn ArtifactStore> = Arc::new(
            FilesystemArtifacts::new(&config.storage.output_dir)
                .await
                .expect("Failed to create artifact store"),
        );
        let signer = Arc::new(ZsignTool::new(&config.signer.zsign_path));

        let state = AppState::new(config, sessions, artifacts, signer);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            temp_dir,
        }
    }

    /// Upload session root.
    pub fn upload_dir(&self) -> PathBuf {
        self.temp_dir.path().join("uploads")
    }

    /// Output directory backing the artifact registry.
    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("output")
    }

    /// Number of signing invocations the fake tool has seen.
    pub fn invocations(&self) -> usize {
        self.invocation_log().lines().count()
    }

    /// Raw argument log of the fake tool, one line per signing invocation.
    pub fn invocation_log(&self) -> String {
        std::fs::read_to_string(self.temp_dir.path().join("invocations.log")).unwrap_or_default()
    }

    /// Drop a file straight into the output directory.
    pub fn seed_artifact(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.output_dir().join(name), contents).expect("Failed to seed artifact");
    }
}

fn write_fake_tool(dir: &Path, script: &str) -> PathBuf {
    let path = dir.join("fake-zsign");
    std::fs::write(&path, script).expect("Failed to write fake tool");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&path)
            .expect("Failed to stat fake tool")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("Failed to chmod fake tool");
    }
    path
}
