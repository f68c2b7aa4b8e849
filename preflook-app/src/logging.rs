use crate::Frontend;
use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Sets up env_logger.
///
/// The terminal front-end owns the screen, so there logging needs a
/// `log_file` and is otherwise switched off.
pub fn init(verbose: u8, quiet: bool, log_file: Option<&Path>, frontend: Frontend) -> Result<()> {
    let mut builder = Builder::new();

    let level = match (frontend, log_file) {
        (Frontend::Terminal, None) => LevelFilter::Off,
        _ => level(verbose, quiet),
    };
    builder.filter_level(level).format(|buf, record| {
        writeln!(
            buf,
            "[{} {}] {}",
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(path) = log_file {
        let file = File::create(path).with_context(|| format!("creating log file {:?}", path))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.try_init().context("initialising logger")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level(0, false), LevelFilter::Info);
        assert_eq!(level(1, false), LevelFilter::Debug);
        assert_eq!(level(3, false), LevelFilter::Trace);
        assert_eq!(level(2, true), LevelFilter::Error);
    }
}
