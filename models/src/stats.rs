use prometheus::{Error as PrometheusError, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};

pub struct ResourceCounters {
    pub guilds: IntGauge,
    pub channels: IntGauge,
    pub roles: IntGauge,
    pub users: IntGauge,
}

/// Metrics shared by the cache and the rate-limit gate of one session
pub struct Stats {
    pub registry: Registry,
    pub event_counts: IntCounterVec,
    pub resource_counts: ResourceCounters,
    pub ratelimited: IntCounter,
}

impl Stats {
    pub fn new() -> Result<Self, PrometheusError> {
        let event_counts = IntCounterVec::new(
            Opts::new("events", "Events ingested into the cache"),
            &["event"],
        )?;
        let resource_counter = IntGaugeVec::new(
            Opts::new("resource_counts", "Counts of cached resources"),
            &["count"],
        )?;
        let ratelimited = IntCounter::with_opts(Opts::new(
            "ratelimited",
            "Calls rejected or delayed by the rate-limit gate",
        ))?;

        let registry = Registry::new_custom(Some("harmony".into()), None)?;
        registry.register(Box::new(event_counts.clone()))?;
        registry.register(Box::new(resource_counter.clone()))?;
        registry.register(Box::new(ratelimited.clone()))?;

        Ok(Stats {
            registry,
            event_counts,
            resource_counts: ResourceCounters {
                guilds: resource_counter.get_metric_with_label_values(&["guilds"])?,
                channels: resource_counter.get_metric_with_label_values(&["channels"])?,
                roles: resource_counter.get_metric_with_label_values(&["roles"])?,
                users: resource_counter.get_metric_with_label_values(&["users"])?,
            },
            ratelimited,
        })
    }

    pub fn record_event(&self, kind: &str) {
        if let Ok(counter) = self.event_counts.get_metric_with_label_values(&[kind]) {
            counter.inc();
        }
    }
}
