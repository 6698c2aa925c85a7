use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();
static BASE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Sets the base directory for all durable artifacts. Call once at startup,
/// after the config is loaded. If never called, the exe directory is used.
pub fn init_base_dir(dir: Option<PathBuf>) {
    let _ = BASE_DIR.set(dir.unwrap_or_else(|| get_exe_dir().clone()));
}

/// Returns the base directory for durable artifacts.
pub fn get_base_dir() -> &'static PathBuf {
    BASE_DIR.get_or_init(|| get_exe_dir().clone())
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the raw screenshots directory: `<base_dir>/raw_images/`
pub fn get_raw_images_dir() -> PathBuf {
    get_base_dir().join("raw_images")
}

/// Returns the transparent output directory: `<base_dir>/transparent_images/`
pub fn get_transparent_images_dir() -> PathBuf {
    get_base_dir().join("transparent_images")
}

/// Returns the progress file path: `<base_dir>/progress.json`
pub fn get_progress_file() -> PathBuf {
    get_base_dir().join("progress.json")
}

/// Returns the manifest file path: `<base_dir>/manifest.json`
pub fn get_manifest_file() -> PathBuf {
    get_base_dir().join("manifest.json")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_raw_images_dir())?;
    std::fs::create_dir_all(get_transparent_images_dir())?;
    Ok(())
}
