use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge_vec, Counter, CounterVec, GaugeVec,
};

lazy_static! {
    // ── Event counters ──────────────────────────────────────────────────────
    pub static ref CREATED_COUNTER: CounterVec = register_counter_vec!(
        "announcements_created_total",
        "Announcements persisted, by backend",
        &["backend"]
    ).unwrap();

    pub static ref REJECTED_COUNTER: Counter = register_counter!(
        "announcements_rejected_total",
        "Submissions rejected by validation"
    ).unwrap();

    pub static ref STORAGE_ERRORS_COUNTER: CounterVec = register_counter_vec!(
        "announcements_storage_errors_total",
        "Storage failures by backend and operation",
        &["backend", "op"]
    ).unwrap();

    pub static ref CORRUPT_RECOVERIES_COUNTER: Counter = register_counter!(
        "announcements_corrupt_recoveries_total",
        "Corrupt JSON data files moved aside and reset"
    ).unwrap();

    pub static ref FALLBACK_IDS_COUNTER: Counter = register_counter!(
        "announcements_fallback_ids_total",
        "Inserts retried with a client-generated id"
    ).unwrap();

    // ── State ───────────────────────────────────────────────────────────────
    pub static ref LISTED_GAUGE: GaugeVec = register_gauge_vec!(
        "announcements_listed",
        "Announcements returned by the most recent list, by backend",
        &["backend"]
    ).unwrap();
}
