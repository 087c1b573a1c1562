use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
const DATA_DIR_ENV: &str = "MAILPIX_DATA_DIR";

/// Application data directory holding the database and uploaded images.
pub fn data_dir() -> std::path::PathBuf {
    if let Ok(override_dir) = std::env::var(DATA_DIR_ENV) {
        let override_dir = override_dir.trim();
        if !override_dir.is_empty() {
            let path = std::path::PathBuf::from(override_dir);
            if !path.exists() {
                std::fs::create_dir_all(&path)
                    .expect("Failed to create data directory");
            }
            return path;
        }
    }

    let path = if cfg!(debug_assertions) {
        std::path::PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("io", "mailpix", "mailpix")
            .expect("OS didn't give us a home directory")
            .data_dir()
            .to_path_buf()
    };

    // Ensure the directory exists
    if !path.exists() {
        std::fs::create_dir_all(&path).expect("Failed to create data directory");
    }

    path
    // ✔ macOS → ~/Library/Application Support/mailpix
    // ✔ Linux → ~/.local/share/mailpix   (respects XDG_DATA_HOME)
    // ✔ Windows → %APPDATA%\mailpix\mailpix
}

pub fn db_path() -> std::path::PathBuf {
    data_dir().join("db.sqlite")
}

/// Flat directory of stored attachment files, created on first access.
pub fn upload_dir() -> std::path::PathBuf {
    let path = data_dir().join("uploads");
    if !path.exists() {
        std::fs::create_dir_all(&path).expect("Failed to create upload directory");
    }
    path
}
