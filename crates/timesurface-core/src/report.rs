//! Daily CSV log for boundary scans, the JSON benchmark report, and the
//! wall-clock reading both are stamped with.
//!
//! # Storage Format
//!
//! One file per day, `time_surface_YYYY-MM-DD.csv`, in the output directory.
//! Dates follow the configured [`TimeBase`] (host local time by default).
//! The header is written only when the file is new or empty, so restarting
//! the scheduler on the same day keeps appending to the same log.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, SecondsFormat, TimeZone, Timelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::calibration::CalibrationData;
use crate::load::LoadTable;
use crate::orchestrator::PatternReport;
use crate::pattern::ScanEntry;
use crate::platform::{MachineInfo, detect_machine_info};
use crate::stats::QuickStats;

/// CSV header line (without trailing newline).
pub const CSV_HEADER: &str =
    "timestamp,hour,minute,type,fft_level,pattern,avg,std_dev,peak_bin,peak_percent";

// ---------------------------------------------------------------------------
// Wall-clock time
// ---------------------------------------------------------------------------

/// Which wall clock stamps rows, names daily files and drives the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeBase {
    /// The host's configured time zone.
    #[default]
    Local,
    Utc,
}

impl TimeBase {
    pub fn now(self) -> WallTime {
        match self {
            Self::Local => WallTime::from_datetime(&Local::now()),
            Self::Utc => WallTime::from_datetime(&Utc::now()),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Local => "local time",
            Self::Utc => "UTC",
        }
    }
}

/// Broken-down wall-clock time in whichever zone it was read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl WallTime {
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }

    /// `YYYY-MM-DD`
    pub fn date_string(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    /// `YYYY-MM-DD HH:MM:SS`
    pub fn timestamp_string(&self) -> String {
        format!(
            "{} {:02}:{:02}:{:02}",
            self.date_string(),
            self.hour,
            self.minute,
            self.second
        )
    }
}

// ---------------------------------------------------------------------------
// Log rows
// ---------------------------------------------------------------------------

/// One line of the scan log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub timestamp: String,
    pub hour: u32,
    pub minute: u32,
    pub pattern_type: String,
    pub fft_level: String,
    pub pattern: String,
    pub stats: QuickStats,
}

impl LogRow {
    pub fn new(at: &WallTime, entry: &ScanEntry, stats: QuickStats) -> Self {
        Self {
            timestamp: at.timestamp_string(),
            hour: at.hour,
            minute: at.minute,
            pattern_type: entry.pattern_type().to_string(),
            fft_level: entry.level.name().to_string(),
            pattern: entry.pattern_name(),
            stats,
        }
    }

    /// Render without trailing newline. Floats to two decimals.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{:.2},{:.2},{},{:.2}",
            self.timestamp,
            self.hour,
            self.minute,
            self.pattern_type,
            self.fft_level,
            self.pattern,
            self.stats.avg,
            self.stats.std_dev,
            self.stats.peak_bin,
            self.stats.peak_percent
        )
    }
}

// ---------------------------------------------------------------------------
// ScanLog
// ---------------------------------------------------------------------------

/// File name of the log for a given day.
pub fn daily_log_name(date: &WallTime) -> String {
    format!("time_surface_{}.csv", date.date_string())
}

/// Append-only CSV writer. Every row is flushed as soon as it is written.
pub struct ScanLog {
    path: PathBuf,
    writer: BufWriter<File>,
    rows_written: u64,
}

impl ScanLog {
    /// Open (or create) the log for `date` under `dir`.
    pub fn open_daily(dir: &Path, date: &WallTime) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        Self::open(dir.join(daily_log_name(date)))
    }

    /// Open (or create) a log at an explicit path.
    pub fn open(path: PathBuf) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_empty = file.metadata()?.len() == 0;
        let mut writer = BufWriter::new(file);
        if is_empty {
            writeln!(writer, "{CSV_HEADER}")?;
            writer.flush()?;
        }
        Ok(Self {
            path,
            writer,
            rows_written: 0,
        })
    }

    pub fn append(&mut self, row: &LogRow) -> std::io::Result<()> {
        writeln!(self.writer, "{}", row.to_csv_line())?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended through this handle.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

// ---------------------------------------------------------------------------
// Benchmark report (JSON)
// ---------------------------------------------------------------------------

/// Everything needed to compare two benchmark runs offline.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub version: u32,
    pub id: String,
    pub created_at: String,
    pub timesurface_version: String,
    pub machine: MachineInfo,
    pub calibration: CalibrationData,
    pub load_table: LoadTable,
    pub iterations: usize,
    pub patterns: Vec<PatternReport>,
}

impl BenchReport {
    pub fn new(
        calibration: CalibrationData,
        load_table: LoadTable,
        iterations: usize,
        patterns: Vec<PatternReport>,
    ) -> Self {
        Self {
            version: 1,
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            timesurface_version: crate::VERSION.to_string(),
            machine: detect_machine_info(),
            calibration,
            load_table,
            iterations,
            patterns,
        }
    }

    /// Pretty-printed JSON written to `path`.
    pub fn write_json(&self, path: &Path) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }
}
