use chrono::Local;
use env_logger::{Builder, Env, Target};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

const LOG_FILE: &str = "kubepulse.log";
const ROTATED_PREFIX: &str = "kubepulse_";
const ROTATE_BYTES: u64 = 5 * 1024 * 1024;
const KEEP_ROTATED: usize = 5;

/// Initialize the `log` backend. With a directory, logs go to `<dir>/kubepulse.log`
/// (rotated when oversized); otherwise to stderr. `RUST_LOG` overrides the default `info` filter.
pub fn init_logger(log_dir: Option<&Path>) -> std::io::Result<Option<PathBuf>> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    let log_file = match log_dir {
        Some(dir) => {
            let path = prepare_log_file(dir)?;
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            builder.target(Target::Pipe(Box::new(file)));
            Some(path)
        }
        None => None,
    };

    // A second init (tests, embedding) keeps the first logger
    if builder.try_init().is_ok() {
        log::info!("Logger initialized");
    }
    Ok(log_file)
}

/// Create the directory and rotate an oversized log file. Returns the active log path.
pub fn prepare_log_file(log_dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let log_file = log_dir.join(LOG_FILE);

    if let Ok(metadata) = fs::metadata(&log_file) {
        if metadata.len() > ROTATE_BYTES {
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            let rotated = log_dir.join(format!("{}{}.log", ROTATED_PREFIX, timestamp));
            let _ = fs::rename(&log_file, &rotated);
            cleanup_old_logs(log_dir);
        }
    }

    Ok(log_file)
}

fn cleanup_old_logs(log_dir: &Path) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut logs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension().map_or(false, |ext| ext == "log")
                    && p.file_stem().map_or(false, |s| s.to_string_lossy().starts_with(ROTATED_PREFIX))
            })
            .collect();

        // Names embed the timestamp, so lexical order is age order
        logs.sort();

        if logs.len() > KEEP_ROTATED {
            for log in logs.iter().take(logs.len() - KEEP_ROTATED) {
                let _ = fs::remove_file(log);
            }
        }
    }
}
