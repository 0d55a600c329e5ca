//! Entry point for the synchronization tool.

use std::ffi::OsStr;
use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use mc_i18n_sync::{
    CacheStore,
    DirectorySource,
    ResourcePack,
    SyncCoordinator,
    config,
};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let (payload_dir, pack_root) = match (args.next(), args.next()) {
        (Some(payloads), Some(pack)) => (PathBuf::from(payloads), PathBuf::from(pack)),
        _ => {
            tracing_subscriber::fmt().init();
            tracing::error!("usage: mc-i18n-sync <payload-dir> <resourcepack-dir>");
            return ExitCode::FAILURE;
        }
    };

    let settings = match config::load_settings(&pack_root) {
        Ok(settings) => settings,
        Err(e) => {
            tracing_subscriber::fmt().init();
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let _guard = init_tracing(&settings.output);

    let pack = ResourcePack::new(pack_root);
    let mut cache = CacheStore::load(&pack.cache_path());
    let source = DirectorySource::new(payload_dir);
    let coordinator = SyncCoordinator::new(&settings, pack);

    match coordinator.run(&source, &mut cache) {
        Ok(report) if report.failed() == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Build the subscriber from the output settings.
///
/// The returned guard keeps the non-blocking file writer flushing until
/// the process exits.
fn init_tracing(
    output: &config::OutputSettings,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(output.verbosity.filter_directive()));

    if let Some(log_file) = &output.log_file {
        let directory = log_file.parent().unwrap_or_else(|| Path::new("."));
        let file_name = log_file.file_name().unwrap_or_else(|| OsStr::new("mc-i18n-sync.log"));
        let appender = tracing_appender::rolling::never(directory, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(writer)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_ansi(output.color).init();
        None
    }
}
