use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use std::path::Path;

pub fn starter_config(session_secret: &str) -> String {
    format!(
        r#"[server]
host = "127.0.0.1"
port = 3000

[auth]
operator_id = "1"
email = "admin@example.com"
# mediadesk hash-password
password_hash = ""
session_secret = "{}"
session_lifetime = "7d"
secure_cookie = false

[store]
backend = "cloudinary"
cloud_name = ""
api_key = ""
api_secret = ""

[upload]
max_batch_size = 50
max_file_size = "10MB"
concurrency = 4
item_timeout_secs = 60

[listing]
default_folder = "netflix-clone"
page_size = 100
"#,
        session_secret
    )
}

pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

pub fn run(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, starter_config(&generate_secret()))?;

    tracing::info!("Created config at {:?}", path);
    tracing::info!("Run 'mediadesk hash-password' and fill in auth.password_hash");
    tracing::info!("Run 'mediadesk serve' to start the server");

    Ok(())
}
