use reqwest::multipart;
use std::path::PathBuf;
use upload_service::config::UploadConfig;
use upload_service::startup::Application;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub upload_dir: PathBuf,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn on a random port with a fresh upload directory; `customize` can
    /// adjust the configuration before the application is built.
    pub async fn spawn_with(customize: impl FnOnce(&mut UploadConfig)) -> Self {
        let upload_dir = PathBuf::from(format!("target/test-uploads-{}", Uuid::new_v4()));

        let mut config = UploadConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0; // Random port for testing
        config.storage.upload_dir = upload_dir.clone();
        customize(&mut config);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let address = format!("http://127.0.0.1:{}", port);

        // Wait for the server by polling the health endpoint
        for _ in 0..50 {
            if client
                .get(format!("{}/health", address))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            upload_dir,
            client,
        }
    }

    pub async fn upload(&self, form: multipart::Form) -> reqwest::Response {
        self.client
            .post(format!("{}/api/upload", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Names of the files currently in the upload directory.
    pub fn stored_files(&self) -> Vec<String> {
        match std::fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn cleanup(&self) {
        let _ = tokio::fs::remove_dir_all(&self.upload_dir).await;
    }
}

pub fn file_part(name: &str, mime: &str, bytes: Vec<u8>) -> multipart::Part {
    multipart::Part::bytes(bytes)
        .file_name(name.to_string())
        .mime_str(mime)
        .unwrap()
}
