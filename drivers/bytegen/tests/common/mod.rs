#![allow(dead_code)]

use std::sync::{Mutex, Once};

use bytegen::{ByteGen, DEVICE_COUNT};
use device_api::{DeviceId, DeviceRange};
use devtmpfs::DevFs;

pub type Host = DevFs<spin::RwLock<()>>;

static LINES: Mutex<Vec<String>> = Mutex::new(Vec::new());
static INSTALL: Once = Once::new();

fn capture_sink(record: &log::Record, _: &()) {
    if let Ok(mut lines) = LINES.lock() {
        lines.push(format!("[{}] {}", record.level(), record.args()));
    }
}

static LOGGER: klog::Logger<1> = klog::Logger {
    sinks: [capture_sink],
    transform: |_| (),
};

/// Routes every log record into an in-memory list for the whole test binary.
pub fn capture_logs() {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).expect("no other logger in tests");
        log::set_max_level(log::LevelFilter::Trace);
    });
}

pub fn logged(needle: &str) -> Vec<String> {
    LINES
        .lock()
        .map(|lines| {
            lines
                .iter()
                .filter(|l| l.contains(needle))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

pub fn loaded(host: &Host) -> ByteGen<'_, Host> {
    match ByteGen::load(host) {
        Ok(module) => module,
        Err(e) => panic!("load failed: {e}"),
    }
}

/// The range a fresh host hands out to the first driver.
pub fn loaded_range() -> DeviceRange {
    DeviceRange::new(DeviceId::new(254, 0), DEVICE_COUNT)
}

pub fn assert_clean(host: &Host) {
    assert!(host.nodes().is_empty(), "nodes left: {:?}", host.nodes());
    assert!(
        host.classes().is_empty(),
        "classes left: {:?}",
        host.classes()
    );
    assert!(
        host.regions().is_empty(),
        "regions left: {:?}",
        host.regions()
    );
    assert!(
        host.bindings().is_empty(),
        "bindings left: {:?}",
        host.bindings()
    );
}
