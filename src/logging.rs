//! Structured logging for the ranking pipeline.
//!
//! Every record is one JSON object per line on stderr. When `LOG_DIR` is set
//! the same lines are appended to `<LOG_DIR>/<run_id>/events.jsonl` so a run
//! can be inspected afterwards.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Data,       // Table loading, coercion, schema checks
    Score,      // Completeness filter, standardization
    Growth,     // Budget trend fitting
    Projection, // Target-year ranking
    Explore,    // Overview, correlations, budget and trade summaries
    System,     // Startup, configuration
    Profile,    // Timing
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Data => "data",
            Domain::Score => "score",
            Domain::Growth => "growth",
            Domain::Projection => "projection",
            Domain::Explore => "explore",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    events: Option<Mutex<BufWriter<File>>>,
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let events = std::env::var("LOG_DIR").ok().and_then(|base| {
            let mut run_dir = PathBuf::from(base);
            run_dir.push(&run_id);
            if let Err(err) = create_dir_all(&run_dir) {
                eprintln!("[log] failed to create run dir: {}", err);
                return None;
            }
            match OpenOptions::new()
                .create(true)
                .append(true)
                .open(run_dir.join("events.jsonl"))
            {
                Ok(f) => Some(Mutex::new(BufWriter::new(f))),
                Err(err) => {
                    eprintln!("[log] failed to create events log: {}", err);
                    None
                }
            }
        });
        RunContext { run_id, events }
    })
}

fn write_line(writer: &Mutex<BufWriter<File>>, line: &str) {
    if let Ok(mut w) = writer.lock() {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit one record on stderr. Stdout is left to the command output.
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let stderr = std::io::stderr();
    log_to(&mut stderr.lock(), level, domain, event, fields);
}

fn log_to<W: Write>(
    out: &mut W,
    level: Level,
    domain: Domain,
    event: &str,
    fields: Map<String, Value>,
) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    let line = render(level, domain.as_str(), event, fields);
    let ctx = ensure_run_context();
    if let Some(events) = &ctx.events {
        write_line(events, &line);
    }
    let _ = writeln!(out, "{}", line);
}

fn render(level: Level, component: &str, event: &str, mut fields: Map<String, Value>) -> String {
    let ctx = ensure_run_context();
    let msg = fields.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));
    Value::Object(entry).to_string()
}

// =============================================================================
// Pipeline logs
// =============================================================================

pub fn log_table_loaded(kind: &str, path: &str, rows: usize, warnings: usize) {
    log(
        Level::Info,
        Domain::Data,
        "table_loaded",
        obj(&[
            ("kind", v_str(kind)),
            ("path", v_str(path)),
            ("rows", json!(rows)),
            ("warnings", json!(warnings)),
        ]),
    );
}

pub fn log_excluded(stage: Domain, reason: &str, countries: &[String]) {
    if countries.is_empty() {
        return;
    }
    log(
        Level::Debug,
        stage,
        "excluded",
        obj(&[
            ("reason", v_str(reason)),
            ("count", json!(countries.len())),
            ("countries", json!(countries)),
        ]),
    );
}

pub fn log_ranking(domain: Domain, event: &str, leaders: &[(&str, f64)]) {
    let top: Vec<Value> = leaders
        .iter()
        .map(|(country, score)| json!({"country": country, "score": score}))
        .collect();
    log(
        Level::Info,
        domain,
        event,
        obj(&[("count", json!(leaders.len())), ("top", Value::Array(top))]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Emits elapsed time for a labelled section when dropped.
pub struct ProfileScope {
    label: &'static str,
    started: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_us = self.started.elapsed().as_micros() as u64;
        log(
            Level::Trace,
            Domain::Profile,
            self.label,
            obj(&[("elapsed_us", json!(elapsed_us))]),
        );
    }
}
