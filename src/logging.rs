use std::path::{Path, PathBuf};

pub const LOG_FILE_BASENAME: &str = "dayflow";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 20 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 10;
pub const LOG_ENV_VAR: &str = "DAYFLOW_LOG";

pub fn log_directory(app_data_dir: &Path) -> PathBuf {
    app_data_dir.join("logs")
}

/// Picks the filter spec: `DAYFLOW_LOG`, then `RUST_LOG`, then the build default.
pub fn log_spec(lookup: impl Fn(&str) -> Option<String>) -> String {
    let default_spec = if cfg!(debug_assertions) {
        "warn,dayflow_lib=debug"
    } else {
        "warn,dayflow_lib=info"
    };
    [LOG_ENV_VAR, "RUST_LOG"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_spec.to_string())
}

#[cfg(all(feature = "app", not(test)))]
pub fn init_logging(app_data_dir: &Path) -> Result<(), flexi_logger::FlexiLoggerError> {
    use flexi_logger::{
        detailed_format, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode,
    };

    let directory = log_directory(app_data_dir);
    std::fs::create_dir_all(&directory)?;

    let spec = log_spec(|key| std::env::var(key).ok());
    Logger::try_with_str(&spec)?
        .log_to_file(
            FileSpec::default()
                .directory(&directory)
                .basename(LOG_FILE_BASENAME)
                .suffix(LOG_FILE_SUFFIX),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(detailed_format)
        .rotate(
            Criterion::Size(LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stdout(if cfg!(debug_assertions) {
            Duplicate::Info
        } else {
            Duplicate::None
        })
        .start()?;

    install_panic_hook();

    log::info!(
        "logger initialized dir={} spec={spec} keep_files={LOG_ROTATE_KEEP_FILES}",
        directory.display()
    );
    Ok(())
}

#[cfg(all(feature = "app", not(test)))]
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info: &std::panic::PanicHookInfo<'_>| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("<non-string panic payload>");
        let location = info
            .location()
            .map(|loc| loc.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("panic: payload={payload} location={location}\nbacktrace:\n{backtrace}");
        default_hook(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_prefers_app_variable_then_rust_log() {
        let spec = log_spec(|key| match key {
            "DAYFLOW_LOG" => Some("trace".to_string()),
            "RUST_LOG" => Some("error".to_string()),
            _ => None,
        });
        assert_eq!(spec, "trace");

        let spec = log_spec(|key| match key {
            "DAYFLOW_LOG" => Some("  ".to_string()),
            "RUST_LOG" => Some("error".to_string()),
            _ => None,
        });
        assert_eq!(spec, "error");

        assert!(log_spec(|_| None).starts_with("warn,dayflow_lib="));
    }

    #[test]
    fn logs_sit_under_app_data() {
        let dir = Path::new("/data/dayflow");
        assert_eq!(log_directory(dir), dir.join("logs"));
    }
}
