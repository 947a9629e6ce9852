//! Shared fixtures for the integration suites: a store wrapper that counts
//! lookups and injects failures, and helpers for driving the router.

#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use visitor_counter::api;
use visitor_counter::auth::OriginGate;
use visitor_counter::clock::ManualClock;
use visitor_counter::storage::{
    CounterRecord, CreateOutcome, MemoryStorage, Storage, StorageError, StorageResult,
};
use visitor_counter::visits::VisitCounter;

pub const TEST_TOKEN: &str = "test-origin-secret";
pub const COOLDOWN_SECS: u64 = 1800;
pub const CACHE_TTL_SECS: u64 = 10;

/// Wraps a [`MemoryStorage`], counting kind lookups and failing on demand
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: MemoryStorage,
    queries: AtomicUsize,
    fail_locks: AtomicBool,
    fail_queries: AtomicBool,
    failing_counters: Mutex<HashSet<String>>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn fail_locks(&self, fail: bool) {
        self.fail_locks.store(fail, Ordering::SeqCst);
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn fail_counter(&self, key: &str) {
        self.failing_counters
            .lock()
            .unwrap()
            .insert(key.to_string());
    }
}

fn injected(what: &str) -> StorageError {
    StorageError::Other(anyhow!("injected {what} failure"))
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn init(&self) -> anyhow::Result<()> {
        self.inner.init().await
    }

    async fn conditional_create(
        &self,
        key: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> StorageResult<CreateOutcome> {
        if self.fail_locks.load(Ordering::SeqCst) {
            return Err(injected("lock"));
        }
        self.inner.conditional_create(key, now, ttl).await
    }

    async fn increment(&self, key: &str, kind: &str, by: u64) -> StorageResult<u64> {
        if self.failing_counters.lock().unwrap().contains(key) {
            return Err(injected("increment"));
        }
        self.inner.increment(key, kind, by).await
    }

    async fn query_by_kind(&self, kind: &str) -> StorageResult<Vec<CounterRecord>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(injected("query"));
        }
        self.inner.query_by_kind(kind).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StorageResult<u64> {
        self.inner.purge_expired(now).await
    }
}

pub struct TestApp {
    pub router: Router,
    pub storage: Arc<FlakyStorage>,
    pub clock: Arc<ManualClock>,
}

pub fn test_app() -> TestApp {
    test_app_with_cors(None)
}

/// Like [`test_app`], with CORS restricted to `https://<domain>` when given
pub fn test_app_with_cors(allowed_domain: Option<&str>) -> TestApp {
    let storage = Arc::new(FlakyStorage::new());
    let clock = Arc::new(ManualClock::starting_now());
    let counter = VisitCounter::with_storage(
        storage.clone(),
        clock.clone(),
        COOLDOWN_SECS,
        CACHE_TTL_SECS,
    );
    let router = api::create_router(
        counter,
        Arc::new(OriginGate::new(TEST_TOKEN)),
        api::cors_layer(allowed_domain).unwrap(),
    );

    TestApp {
        router,
        storage,
        clock,
    }
}

/// A visit as the edge would forward it
pub fn visit_request(address: &str, agent: &str, country: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri("/")
        .header("X-Origin-Verify", TEST_TOKEN)
        .header("CloudFront-Viewer-Address", address)
        .header("User-Agent", agent);

    if let Some(country) = country {
        builder = builder.header("CloudFront-Viewer-Country", country);
    }

    builder.body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
