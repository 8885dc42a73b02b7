// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache telemetry through `tracing` and, with the `metrics` feature,
//! OpenTelemetry metrics.
//!
//! Every cache operation and every container provisioning is recorded as one
//! event with the cache name, the operation, its activity (hit, miss, error,
//! ...) and how long it took.

use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use opentelemetry::{
    KeyValue,
    metrics::{Counter, Histogram, Meter, MeterProvider},
};
use tick::Clock;
use tracing::Level;

pub(crate) mod attributes;
#[cfg(feature = "metrics")]
pub(crate) mod metrics;
#[cfg(test)]
pub(crate) mod testing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheOperation {
    Get,
    Set,
    Add,
    Remove,
    Exists,
    KeyExpire,
    Provision,
}

impl CacheOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "cache.get",
            Self::Set => "cache.set",
            Self::Add => "cache.add",
            Self::Remove => "cache.remove",
            Self::Exists => "cache.exists",
            Self::KeyExpire => "cache.key_expire",
            Self::Provision => "cache.provision",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheActivity {
    Hit,
    Miss,
    Inserted,
    Removed,
    Provisioned,
    Unsupported,
    Error,
}

impl CacheActivity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "cache.hit",
            Self::Miss => "cache.miss",
            Self::Inserted => "cache.inserted",
            Self::Removed => "cache.removed",
            Self::Provisioned => "cache.provisioned",
            Self::Unsupported => "cache.unsupported",
            Self::Error => "cache.error",
        }
    }

    pub fn level(self) -> Level {
        match self {
            Self::Hit | Self::Miss | Self::Unsupported => Level::DEBUG,
            Self::Inserted | Self::Removed | Self::Provisioned => Level::INFO,
            Self::Error => Level::ERROR,
        }
    }
}

#[derive(Debug)]
struct CacheTelemetryInner {
    clock: Clock,
    logging_enabled: bool,
    #[cfg(feature = "metrics")]
    event_counter: Option<Counter<u64>>,
    #[cfg(feature = "metrics")]
    operation_duration: Option<Histogram<f64>>,
}

/// Records cache events. Cheap to clone; clones share instruments.
#[derive(Clone, Debug)]
pub(crate) struct CacheTelemetry {
    inner: Arc<CacheTelemetryInner>,
}

impl CacheTelemetry {
    pub fn new(logging_enabled: bool, clock: Clock) -> Self {
        Self {
            inner: Arc::new(CacheTelemetryInner {
                clock,
                logging_enabled,
                #[cfg(feature = "metrics")]
                event_counter: None,
                #[cfg(feature = "metrics")]
                operation_duration: None,
            }),
        }
    }

    /// Returns a copy of this telemetry that also reports metrics to `provider`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(&self, provider: &dyn MeterProvider) -> Self {
        let meter: Meter = metrics::create_meter(provider);
        Self {
            inner: Arc::new(CacheTelemetryInner {
                clock: self.inner.clock.clone(),
                logging_enabled: self.inner.logging_enabled,
                event_counter: Some(metrics::create_event_counter(&meter)),
                operation_duration: Some(metrics::create_operation_duration_histogram(&meter)),
            }),
        }
    }

    /// Returns the clock used for timing operations.
    #[inline]
    pub fn clock(&self) -> &Clock {
        &self.inner.clock
    }

    /// Returns the time elapsed since `started`, an instant from [`Self::clock`].
    pub fn elapsed(&self, started: std::time::Instant) -> Duration {
        self.inner.clock.instant().saturating_duration_since(started)
    }

    pub fn record(&self, cache_name: &str, operation: CacheOperation, activity: CacheActivity, duration: Duration) {
        #[cfg(feature = "metrics")]
        {
            let attrs = [
                KeyValue::new(attributes::CACHE_NAME, cache_name.to_string()),
                KeyValue::new(attributes::CACHE_OPERATION_NAME, operation.as_str()),
                KeyValue::new(attributes::CACHE_ACTIVITY_NAME, activity.as_str()),
            ];

            if let Some(c) = &self.inner.event_counter {
                c.add(1, &attrs);
            }

            if let Some(h) = &self.inner.operation_duration {
                h.record(duration.as_secs_f64(), &attrs);
            }
        }

        if self.inner.logging_enabled {
            Self::emit(cache_name, operation, activity, duration);
        }
    }

    fn emit(cache_name: &str, operation: CacheOperation, activity: CacheActivity, duration: Duration) {
        let op = operation.as_str();
        let ev = activity.as_str();
        let duration_ns = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        // Tracing level must be constant, so a macro selects the level.
        // Field names must match the constants in attributes.rs.
        macro_rules! emit_event {
            ($level:ident) => {
                tracing::$level!(
                    cache.name = cache_name,
                    cache.operation = op,
                    cache.activity = ev,
                    cache.duration_ns = duration_ns,
                    "cache.event"
                )
            };
        }

        let level = activity.level();
        if level == Level::ERROR {
            emit_event!(error);
        } else if level == Level::INFO {
            emit_event!(info);
        } else {
            emit_event!(debug);
        }
    }
}
