use std::sync::atomic::{AtomicBool, Ordering};

use klog::Logger;
use log::{LevelFilter, Record, SetLoggerError};
use serde::Serialize;

static JSON: AtomicBool = AtomicBool::new(false);

pub struct RecordData {
    pub thread: String,
}

fn transform(_: &Record) -> RecordData {
    let thread = std::thread::current();
    RecordData {
        thread: thread
            .name()
            .map_or_else(|| format!("{:?}", thread.id()), str::to_owned),
    }
}

fn print_sink(record: &Record, data: &RecordData) {
    eprintln!(
        "[{}][{}][{}] {}",
        data.thread,
        record.target(),
        record.level(),
        record.args()
    )
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    level: &'a str,
    target: &'a str,
    thread: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    module_path: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
}

fn json_sink(record: &Record, data: &RecordData) {
    if !JSON.load(Ordering::Relaxed) {
        return;
    }
    let line = JsonRecord {
        level: record.level().as_str(),
        target: record.target(),
        thread: &data.thread,
        message: record.args().to_string(),
        module_path: record.module_path(),
        line: record.line(),
    };
    if let Ok(json) = serde_json::to_string(&line) {
        eprintln!("{json}");
    }
}

static LOGGER: Logger<2, RecordData> = Logger {
    sinks: [print_sink, json_sink],
    transform,
};

pub fn init(level: LevelFilter, json: bool) -> Result<(), SetLoggerError> {
    JSON.store(json, Ordering::Relaxed);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}
