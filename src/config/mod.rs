//! 設定の読み込みとバリデーション

mod loader;
mod types;

use std::path::Path;

pub use loader::CONFIG_FILE_NAME;
pub use types::{
    ConfigError,
    OutputSettings,
    SyncSettings,
    ValidationError,
    Verbosity,
};

/// Load settings from the pack root, falling back to defaults when no
/// configuration file exists, then validate.
///
/// # Errors
/// - ファイル読み込みエラー
/// - JSON パースエラー
/// - バリデーションエラー
pub fn load_settings(pack_root: &Path) -> Result<SyncSettings, ConfigError> {
    let settings = loader::load_from_pack_root(pack_root)?.map_or_else(SyncSettings::default, |s| {
        tracing::debug!("Loaded pack settings: {:?}", s);
        s
    });

    settings.validate().map_err(ConfigError::ValidationErrors)?;

    Ok(settings)
}
