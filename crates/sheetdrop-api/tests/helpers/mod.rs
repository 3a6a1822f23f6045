//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p sheetdrop-api --test ingest_test`.

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use sheetdrop_api::setup::routes;
use sheetdrop_api::AppState;
use sheetdrop_core::Config;
use sheetdrop_storage::{LocalStorage, Storage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const UPLOAD_PATH: &str = "/api/upload";

/// Test application: server plus the temp directory it writes into.
pub struct TestApp {
    pub server: TestServer,
    pub _temp_dir: TempDir,
    pub upload_dir: PathBuf,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Names of every entry in the upload directory, sorted.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries
                .map(|e| e.expect("Failed to read dir entry"))
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

/// App with a 1 MiB upload ceiling writing into a fresh temp directory.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

pub async fn setup_test_app_with(vars: &[(&str, &str)]) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let upload_dir = temp_dir.path().join("uploads");

    let mut env: HashMap<String, String> = HashMap::new();
    env.insert("MAX_UPLOAD_SIZE_MB".to_string(), "1".to_string());
    env.insert("UPLOAD_DIR".to_string(), upload_dir.display().to_string());
    for (k, v) in vars {
        env.insert(k.to_string(), v.to_string());
    }

    let config = Config::from_lookup(|k| env.get(k).cloned(), temp_dir.path())
        .expect("Failed to build test config");
    let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(
        config.upload_dir.clone(),
        config.collision_policy,
    ));
    let state = Arc::new(AppState::new(config.clone(), storage));

    let app = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        _temp_dir: temp_dir,
        upload_dir,
    }
}

/// Multipart form with a single `file` part.
pub fn file_form(file_name: &str, mime_type: &str, content: Vec<u8>) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(content))
        .file_name(file_name.to_string())
        .mime_type(mime_type.to_string());
    MultipartForm::new().add_part("file", part)
}

pub fn read_stored(path: &Path) -> Vec<u8> {
    std::fs::read(path).expect("Failed to read stored file")
}
