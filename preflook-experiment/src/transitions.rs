use preflook_core::{Dwell, Region, format_duration};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What a log row records
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Focus(Region),
    Finish,
    Abort,
}

impl Marker {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Marker::Focus(_))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Focus(region) => region.fmt(f),
            Marker::Finish => f.write_str("finish"),
            Marker::Abort => f.write_str("abort"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub marker: Marker,
    /// Time since the trial started
    pub since_start: Duration,
    /// Time since the previous entry
    pub since_previous: Duration,
    pub totals: Dwell,
}

/// Append-only audit trail of focus transitions for one trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionLog {
    entries: Vec<LogEntry>,
    start: Duration,
    last: Duration,
}

impl TransitionLog {
    pub const HEADER: &'static str = "focus, timestamp, time since last action, total away time, total left time, total right time";
    const SEPARATOR: &'static str = ", ";

    /// Opens the log with the initial region at zero elapsed time
    pub(crate) fn new(start: Duration, initial: Region) -> Self {
        let mut log = Self {
            entries: Vec::with_capacity(16),
            start,
            last: start,
        };
        log.append(Marker::Focus(initial), start, Dwell::default());
        log
    }

    pub(crate) fn append(&mut self, marker: Marker, now: Duration, totals: Dwell) {
        let now = now.max(self.last);
        self.entries.push(LogEntry {
            marker,
            since_start: now - self.start,
            since_previous: now - self.last,
            totals,
        });
        self.last = now;
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// True once a finish or abort row has been written
    pub fn is_closed(&self) -> bool {
        self.entries.last().is_some_and(|e| e.marker.is_terminal())
    }

    pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "{}", Self::HEADER)?;
        for entry in &self.entries {
            let fields = [
                entry.marker.to_string(),
                format_duration(entry.since_start),
                format_duration(entry.since_previous),
                format_duration(entry.totals.away),
                format_duration(entry.totals.left),
                format_duration(entry.totals.right),
            ];
            writeln!(out, "{}", fields.join(Self::SEPARATOR))?;
        }
        out.flush()
    }

    pub fn to_csv_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_csv(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Writes the log as `dir/file_name`, once, and returns the path written.
    pub fn persist(&self, dir: &Path, file_name: &str) -> io::Result<PathBuf> {
        let path = dir.join(file_name);
        let file = File::create(&path)?;
        self.write_csv(BufWriter::new(file))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn sample() -> TransitionLog {
        let mut log = TransitionLog::new(ms(1000), Region::Away);
        let mut totals = Dwell::default();
        totals.away = ms(250);
        log.append(Marker::Focus(Region::Left), ms(1250), totals);
        totals.left = ms(1050);
        log.append(Marker::Finish, ms(2300), totals);
        log
    }

    #[test]
    fn first_entry_is_initial_region_at_zero() {
        let log = TransitionLog::new(ms(40), Region::Away);
        let first = &log.entries()[0];
        assert_eq!(first.marker, Marker::Focus(Region::Away));
        assert_eq!(first.since_start, Duration::ZERO);
        assert_eq!(first.since_previous, Duration::ZERO);
        assert!(!log.is_closed());
    }

    #[test]
    fn deltas_are_measured_from_previous_entry() {
        let log = sample();
        let deltas: Vec<_> = log.entries().iter().map(|e| e.since_previous).collect();
        assert_eq!(deltas, [ms(0), ms(250), ms(1050)]);
        assert_eq!(log.entries()[2].since_start, ms(1300));
        assert!(log.is_closed());
    }

    #[test]
    fn csv_layout() {
        let csv = sample().to_csv_string();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], TransitionLog::HEADER);
        assert_eq!(
            lines[1],
            "away, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000"
        );
        assert_eq!(
            lines[2],
            "left, 0.250000, 0.250000, 0.250000, 0.000000, 0.000000"
        );
        assert_eq!(
            lines[3],
            "finish, 1.300000, 1.050000, 0.250000, 1.050000, 0.000000"
        );
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn persist_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample().persist(dir.path(), "Trial 1.csv").unwrap();
        assert_eq!(path, dir.path().join("Trial 1.csv"));
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, sample().to_csv_string());
    }

    #[test]
    fn persist_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(sample().persist(&missing, "x.csv").is_err());
    }
}
