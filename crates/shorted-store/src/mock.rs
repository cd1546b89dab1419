//! Recording mocks for the store seams.
//!
//! Hand-rolled rather than generated: each mock records the calls it
//! receives behind interior mutability and exposes scripted failure
//! switches, so drain and orchestration tests can assert on exactly what
//! reached the store and when.

use crate::error::{StoreError, StoreResult};
use crate::object::ObjectStore;
use crate::stream::{RecordStream, StreamRecord};
use crate::table::{TableStore, ThroughputChange};
use crate::BoxFuture;
use parking_lot::Mutex;
use shorted_core::DatedRecord;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// In-memory object store.
#[derive(Default)]
pub struct MockObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    puts: Mutex<Vec<(String, String)>>,
    fail_transport: AtomicBool,
}

impl MockObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object.
    pub fn insert_object(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.objects
            .lock()
            .insert((bucket.to_string(), key.to_string()), body);
    }

    /// Make every call fail with a transport error.
    pub fn set_fail_transport(&self, fail: bool) {
        self.fail_transport.store(fail, Ordering::SeqCst);
    }

    /// Bucket/key pairs that were uploaded.
    pub fn recorded_puts(&self) -> Vec<(String, String)> {
        self.puts.lock().clone()
    }

    /// Body stored under a bucket/key pair, if any.
    pub fn stored(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

impl ObjectStore for MockObjectStore {
    fn get(&self, bucket: &str, key: &str) -> BoxFuture<'_, StoreResult<Vec<u8>>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            if self.fail_transport.load(Ordering::SeqCst) {
                return Err(StoreError::Transport("injected transport failure".into()));
            }
            self.objects
                .lock()
                .get(&(bucket.clone(), key.clone()))
                .cloned()
                .ok_or(StoreError::NotFound { bucket, key })
        })
    }

    fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> BoxFuture<'_, StoreResult<()>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            if self.fail_transport.load(Ordering::SeqCst) {
                return Err(StoreError::Transport("injected transport failure".into()));
            }
            self.puts.lock().push((bucket.clone(), key.clone()));
            self.objects.lock().insert((bucket, key), body);
            Ok(())
        })
    }
}

/// In-memory table store with capacity bookkeeping.
///
/// Records every put with the instant it entered the store, tracks the
/// high-water mark of concurrent puts, and can delay or fail writes to
/// exercise the drain's pacing and failure paths.
pub struct MockTableStore {
    write_units: Mutex<HashMap<String, i64>>,
    capacity_calls: Mutex<Vec<(String, i64)>>,
    fail_capacity_units: Mutex<HashSet<i64>>,
    puts: Mutex<Vec<(String, DatedRecord)>>,
    put_instants: Mutex<Vec<Instant>>,
    fail_puts: AtomicBool,
    put_delay: Mutex<Option<Duration>>,
    inflight: AtomicUsize,
    max_inflight: AtomicUsize,
    markers: Mutex<HashMap<(String, String), String>>,
}

impl Default for MockTableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTableStore {
    /// Create an empty table store.
    pub fn new() -> Self {
        Self {
            write_units: Mutex::new(HashMap::new()),
            capacity_calls: Mutex::new(Vec::new()),
            fail_capacity_units: Mutex::new(HashSet::new()),
            puts: Mutex::new(Vec::new()),
            put_instants: Mutex::new(Vec::new()),
            fail_puts: AtomicBool::new(false),
            put_delay: Mutex::new(None),
            inflight: AtomicUsize::new(0),
            max_inflight: AtomicUsize::new(0),
            markers: Mutex::new(HashMap::new()),
        }
    }

    /// Seed a table's current write units.
    pub fn set_write_units(&self, table: &str, units: i64) {
        self.write_units.lock().insert(table.to_string(), units);
    }

    /// Fail capacity set calls targeting the given units value; lets a
    /// test break the raise (bulk units) or the restore (steady units)
    /// independently.
    pub fn fail_capacity_sets_to(&self, units: i64) {
        self.fail_capacity_units.lock().insert(units);
    }

    /// Make every record put fail.
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Hold each put for the given duration before completing.
    pub fn set_put_delay(&self, delay: Duration) {
        *self.put_delay.lock() = Some(delay);
    }

    /// Capacity set calls in arrival order.
    pub fn capacity_calls(&self) -> Vec<(String, i64)> {
        self.capacity_calls.lock().clone()
    }

    /// Successfully stored records in arrival order.
    pub fn recorded_puts(&self) -> Vec<(String, DatedRecord)> {
        self.puts.lock().clone()
    }

    /// Instant each put (successful or not) entered the store.
    pub fn put_instants(&self) -> Vec<Instant> {
        self.put_instants.lock().clone()
    }

    /// Total puts attempted against the store.
    pub fn put_attempts(&self) -> usize {
        self.put_instants.lock().len()
    }

    /// Highest number of puts observed in flight at once.
    pub fn max_inflight(&self) -> usize {
        self.max_inflight.load(Ordering::SeqCst)
    }

    /// Seed a freshness marker.
    pub fn set_marker(&self, table: &str, key: &str, timestamp: &str) {
        self.markers.lock().insert(
            (table.to_string(), key.to_string()),
            timestamp.to_string(),
        );
    }

    /// Read back a freshness marker.
    pub fn marker(&self, table: &str, key: &str) -> Option<String> {
        self.markers
            .lock()
            .get(&(table.to_string(), key.to_string()))
            .cloned()
    }
}

impl TableStore for MockTableStore {
    fn set_write_capacity(
        &self,
        table: &str,
        write_units: i64,
    ) -> BoxFuture<'_, StoreResult<ThroughputChange>> {
        let table = table.to_string();
        Box::pin(async move {
            self.capacity_calls.lock().push((table.clone(), write_units));
            if self.fail_capacity_units.lock().contains(&write_units) {
                return Err(StoreError::Transport("injected capacity failure".into()));
            }
            let mut units = self.write_units.lock();
            let previous = units.insert(table, write_units).unwrap_or(write_units);
            Ok(ThroughputChange {
                previous,
                current: write_units,
            })
        })
    }

    fn put_record(&self, table: &str, record: &DatedRecord) -> BoxFuture<'_, StoreResult<()>> {
        let table = table.to_string();
        let record = record.clone();
        Box::pin(async move {
            let inflight = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_inflight.fetch_max(inflight, Ordering::SeqCst);
            self.put_instants.lock().push(Instant::now());
            let delay = *self.put_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.inflight.fetch_sub(1, Ordering::SeqCst);
            if self.fail_puts.load(Ordering::SeqCst) {
                return Err(StoreError::Rejected("injected put failure".into()));
            }
            self.puts.lock().push((table, record));
            Ok(())
        })
    }

    fn get_last_modified(&self, table: &str, key: &str) -> BoxFuture<'_, StoreResult<String>> {
        let table = table.to_string();
        let key = key.to_string();
        Box::pin(async move {
            self.markers
                .lock()
                .get(&(table.clone(), key.clone()))
                .cloned()
                .ok_or(StoreError::MarkerMissing { table, key })
        })
    }

    fn put_last_modified(
        &self,
        table: &str,
        key: &str,
        timestamp: &str,
    ) -> BoxFuture<'_, StoreResult<()>> {
        let table = table.to_string();
        let key = key.to_string();
        let timestamp = timestamp.to_string();
        Box::pin(async move {
            self.markers.lock().insert((table, key), timestamp);
            Ok(())
        })
    }
}

/// Recording stream sink.
#[derive(Default)]
pub struct MockRecordStream {
    publishes: Mutex<Vec<(String, Vec<StreamRecord>)>>,
    fail: AtomicBool,
}

impl MockRecordStream {
    /// Create an empty stream sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Publishes in arrival order.
    pub fn recorded_publishes(&self) -> Vec<(String, Vec<StreamRecord>)> {
        self.publishes.lock().clone()
    }
}

impl RecordStream for MockRecordStream {
    fn put_records(
        &self,
        stream: &str,
        records: Vec<StreamRecord>,
    ) -> BoxFuture<'_, StoreResult<()>> {
        let stream = stream.to_string();
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::Transport("injected stream failure".into()));
            }
            self.publishes.lock().push((stream, records));
            Ok(())
        })
    }
}
