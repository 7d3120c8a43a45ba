use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::SystemTime;

use arrow::array::{Array, AsArray, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use super::model::{AccidentDataset, AccidentRecord, LoadStats};
use super::region::region_name;

/// File read when no path is given.
pub const DEFAULT_DATA_PATH: &str = "US_Accidents_March23.csv";
/// Upper bound on the number of records kept after loading.
pub const SAMPLE_SIZE: usize = 2_000_000;
pub const SAMPLE_SEED: u64 = 42;

pub const START_TIME: &str = "Start_Time";
pub const START_LAT: &str = "Start_Lat";
pub const START_LNG: &str = "Start_Lng";
pub const STATE: &str = "State";
pub const WEATHER_CONDITION: &str = "Weather_Condition";
pub const SEVERITY: &str = "Severity";

/// Columns every source file must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    START_TIME,
    START_LAT,
    START_LNG,
    STATE,
    WEATHER_CONDITION,
    SEVERITY,
];

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Unsupported file extension: .{0}")]
    UnsupportedExtension(String),
}

// ---------------------------------------------------------------------------
// Load options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadOptions {
    /// Maximum number of records kept. Smaller sources are kept whole.
    pub sample_size: usize,
    /// Seed for the sampling RNG.
    pub seed: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            sample_size: SAMPLE_SIZE,
            seed: SAMPLE_SEED,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a dataset through the process-wide cache.
///
/// The first call for a given path and options reads the file; later calls
/// return the same `Arc` until the file changes on disk.
pub fn load(path: &Path, options: &LoadOptions) -> Result<Arc<AccidentDataset>, DataLoadError> {
    global_cache().get(path, options)
}

/// Forget every cached load of `path` so the next [`load`] rereads it.
pub fn invalidate(path: &Path) {
    global_cache().invalidate(path);
}

fn global_cache() -> &'static DatasetCache {
    static CACHE: OnceLock<DatasetCache> = OnceLock::new();
    CACHE.get_or_init(DatasetCache::new)
}

/// Load a dataset from a file without caching.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` (or no extension) – header row with at least [`REQUIRED_COLUMNS`]
/// * `.parquet` / `.pq`       – same columns, cast to the expected types
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<AccidentDataset, DataLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    log::info!("Loading accidents from {}", path.display());

    let mut builder = RecordBuilder::default();
    match ext.as_str() {
        "csv" | "" => read_csv(path, &mut builder)?,
        "parquet" | "pq" => read_parquet(path, &mut builder)?,
        other => return Err(DataLoadError::UnsupportedExtension(other.to_string())),
    }

    let dataset = builder.finish(options);
    let stats = dataset.stats();
    log::info!(
        "Read {} rows: {} malformed, {} without coordinates, {} kept after sampling",
        stats.rows_read,
        stats.rows_malformed,
        stats.rows_missing_coordinates,
        stats.rows_retained
    );
    if stats.unparsed_timestamps > 0 || stats.unmapped_regions > 0 {
        log::debug!(
            "{} unparseable start times, {} unmapped state codes",
            stats.unparsed_timestamps,
            stats.unmapped_regions
        );
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Timestamp parsing
// ---------------------------------------------------------------------------

/// Parse a start time. Returns `None` for anything unrecognised.
///
/// Accepted layouts: `YYYY-MM-DD HH:MM:SS[.fff]` (space or `T` separator),
/// `YYYY-MM-DD HH:MM`, RFC 3339 with an offset (wall-clock time is kept) and
/// a bare `YYYY-MM-DD` (midnight).
pub fn parse_start_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// Record building, shared by all formats
// ---------------------------------------------------------------------------

/// One decoded source row before validation.
#[derive(Debug, Deserialize)]
struct RawAccident<'a> {
    #[serde(rename = "Start_Time", borrow)]
    start_time: Option<&'a str>,
    #[serde(rename = "Start_Lat", deserialize_with = "csv::invalid_option")]
    start_lat: Option<f64>,
    #[serde(rename = "Start_Lng", deserialize_with = "csv::invalid_option")]
    start_lng: Option<f64>,
    #[serde(rename = "State", borrow)]
    state: Option<&'a str>,
    #[serde(rename = "Weather_Condition", borrow)]
    weather_condition: Option<&'a str>,
    #[serde(rename = "Severity", deserialize_with = "csv::invalid_option")]
    severity: Option<i64>,
}

#[derive(Default)]
struct RecordBuilder {
    records: Vec<AccidentRecord>,
    /// Weather labels repeat millions of times; share one allocation each.
    weather: HashMap<String, Arc<str>>,
    stats: LoadStats,
}

impl RecordBuilder {
    fn push(&mut self, raw: RawAccident<'_>) {
        self.stats.rows_read += 1;

        let (Some(lat), Some(lng)) = (raw.start_lat, raw.start_lng) else {
            self.stats.rows_missing_coordinates += 1;
            return;
        };
        if !lat.is_finite() || !lng.is_finite() {
            self.stats.rows_missing_coordinates += 1;
            return;
        }

        let start_time = raw.start_time.and_then(parse_start_time);
        if start_time.is_none() {
            self.stats.unparsed_timestamps += 1;
        }

        let region = raw.state.and_then(region_name);
        if region.is_none() {
            self.stats.unmapped_regions += 1;
        }

        let weather = raw
            .weather_condition
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(|w| self.intern_weather(w));

        self.records.push(AccidentRecord::new(
            start_time,
            lat,
            lng,
            region,
            weather,
            raw.severity,
        ));
    }

    fn skip_malformed(&mut self) {
        self.stats.rows_read += 1;
        self.stats.rows_malformed += 1;
    }

    fn intern_weather(&mut self, label: &str) -> Arc<str> {
        if let Some(shared) = self.weather.get(label) {
            return shared.clone();
        }
        let shared: Arc<str> = Arc::from(label);
        self.weather.insert(label.to_string(), shared.clone());
        shared
    }

    fn finish(self, options: &LoadOptions) -> AccidentDataset {
        let mut stats = self.stats;
        // Stats for unparsed timestamps and unmapped regions describe the
        // pre-sampling population.
        let records = sample_records(self.records, options.sample_size, options.seed);
        stats.rows_retained = records.len();
        AccidentDataset::with_stats(records, stats)
    }
}

/// Keep at most `size` records, chosen deterministically from `seed`.
/// Sources no larger than `size` are returned unchanged. Retained records
/// keep their source order.
fn sample_records(records: Vec<AccidentRecord>, size: usize, seed: u64) -> Vec<AccidentRecord> {
    if records.len() <= size {
        return records;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keep = vec![false; records.len()];
    for idx in rand::seq::index::sample(&mut rng, records.len(), size).iter() {
        keep[idx] = true;
    }
    records
        .into_iter()
        .zip(keep)
        .filter_map(|(rec, kept)| kept.then_some(rec))
        .collect()
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path, builder: &mut RecordBuilder) -> Result<(), DataLoadError> {
    let csv_err = |source: csv::Error| DataLoadError::Csv {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    // Padded header names (" Start_Lat") still bind to their columns.
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers = reader.headers().map_err(csv_err)?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DataLoadError::MissingColumn(column.to_string()));
        }
    }

    let mut record = csv::StringRecord::new();
    let mut malformed = 0usize;
    loop {
        match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => match record.deserialize::<RawAccident>(Some(&headers)) {
                Ok(raw) => builder.push(raw),
                Err(e) => {
                    log::trace!("  skipping malformed row: {e}");
                    builder.skip_malformed();
                    malformed += 1;
                }
            },
            Err(e) if e.is_io_error() => return Err(csv_err(e)),
            Err(e) => {
                log::trace!("  skipping unreadable row: {e}");
                builder.skip_malformed();
                malformed += 1;
            }
        }
    }

    if malformed > 0 {
        log::warn!("Skipped {malformed} malformed rows in {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Read a Parquet file with the same columns as the CSV layout.
///
/// Each column is cast to the type the loader expects (`Utf8` for text and
/// timestamps, `Float64` for coordinates, `Int64` for severity); values that
/// do not survive the cast become null, the same as unparseable CSV cells.
fn read_parquet(path: &Path, builder: &mut RecordBuilder) -> Result<(), DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let reader_builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema = reader_builder.schema().clone();
    for column in REQUIRED_COLUMNS {
        if schema.index_of(column).is_err() {
            return Err(DataLoadError::MissingColumn(column.to_string()));
        }
    }

    for batch in reader_builder.build()? {
        let batch = batch?;
        let start_time = string_column(&batch, START_TIME)?;
        let lat = float_column(&batch, START_LAT)?;
        let lng = float_column(&batch, START_LNG)?;
        let state = string_column(&batch, STATE)?;
        let weather = string_column(&batch, WEATHER_CONDITION)?;
        let severity = int_column(&batch, SEVERITY)?;

        for row in 0..batch.num_rows() {
            builder.push(RawAccident {
                start_time: start_time.is_valid(row).then(|| start_time.value(row)),
                start_lat: lat.is_valid(row).then(|| lat.value(row)),
                start_lng: lng.is_valid(row).then(|| lng.value(row)),
                state: state.is_valid(row).then(|| state.value(row)),
                weather_condition: weather.is_valid(row).then(|| weather.value(row)),
                severity: severity.is_valid(row).then(|| severity.value(row)),
            });
        }
    }
    Ok(())
}

fn column_as(batch: &RecordBatch, name: &str, to: &DataType) -> Result<Arc<dyn Array>, DataLoadError> {
    let col = batch
        .column_by_name(name)
        .ok_or_else(|| DataLoadError::MissingColumn(name.to_string()))?;
    Ok(cast(col, to)?)
}

fn string_column(batch: &RecordBatch, name: &str) -> Result<StringArray, DataLoadError> {
    Ok(column_as(batch, name, &DataType::Utf8)?.as_string::<i32>().clone())
}

fn float_column(batch: &RecordBatch, name: &str) -> Result<Float64Array, DataLoadError> {
    Ok(column_as(batch, name, &DataType::Float64)?
        .as_primitive::<Float64Type>()
        .clone())
}

fn int_column(batch: &RecordBatch, name: &str) -> Result<Int64Array, DataLoadError> {
    Ok(column_as(batch, name, &DataType::Int64)?
        .as_primitive::<Int64Type>()
        .clone())
}

// ---------------------------------------------------------------------------
// Dataset cache
// ---------------------------------------------------------------------------

/// Identifies the on-disk state of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl Fingerprint {
    fn of(path: &Path) -> Result<Self, DataLoadError> {
        let meta = std::fs::metadata(path).map_err(|source| DataLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Fingerprint {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

struct CachedDataset {
    fingerprint: Fingerprint,
    dataset: Arc<AccidentDataset>,
}

/// Init-once memoization of loaded datasets keyed by path and options.
///
/// Entries are reloaded when the source file's length or modification time
/// changes, and can be dropped explicitly with [`DatasetCache::invalidate`].
#[derive(Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<(PathBuf, LoadOptions), CachedDataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path, options: &LoadOptions) -> Result<Arc<AccidentDataset>, DataLoadError> {
        let key_path = cache_key(path);
        let fingerprint = Fingerprint::of(path)?;

        // Held across the load so concurrent callers never read the file twice.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (key_path, *options);

        if let Some(cached) = entries.get(&key) {
            if cached.fingerprint == fingerprint {
                log::debug!("Dataset cache hit for {}", path.display());
                return Ok(cached.dataset.clone());
            }
            log::debug!("{} changed on disk, reloading", path.display());
        }

        let dataset = Arc::new(load_file(path, options)?);
        entries.insert(
            key,
            CachedDataset {
                fingerprint,
                dataset: dataset.clone(),
            },
        );
        Ok(dataset)
    }

    /// Drop every cached entry for `path`, whatever options it was loaded with.
    pub fn invalidate(&self, path: &Path) {
        let key_path = cache_key(path);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(p, _), _| *p != key_path);
        log::debug!(
            "Invalidated {} cached dataset(s) for {}",
            before - entries.len(),
            path.display()
        );
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
