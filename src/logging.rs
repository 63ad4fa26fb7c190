use std::fs::{self, OpenOptions};
use std::path::Path;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

/// Install a file logger at `level`. `LevelFilter::Off` installs nothing.
pub fn init(level: LevelFilter, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if level == LevelFilter::Off {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, config, file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn off_level_creates_no_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("steer.log");
        init(LevelFilter::Off, &path).unwrap();
        assert!(!path.exists());
    }
}
