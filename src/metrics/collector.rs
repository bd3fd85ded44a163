//! Turns a poll plus the cached snapshot into metric families.

use crate::device::{
    Clock, DeviceConfig, HttpStatusSource, PollCoordinator, PollOutcome, Snapshot, SnapshotCache,
    StatusSource, TokioClock,
};
use crate::error::Result;
use crate::metrics::descriptors::Descriptors;
use crate::metrics::encoder::{encode, MetricFamily};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, info_span, warn};

/// Probe temperatures outside this range are treated as a disconnected probe.
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=212.0;

/// Probe humidity outside this range is treated as a disconnected probe.
pub const HUMIDITY_RANGE: RangeInclusive<f64> = 0.0..=100.0;

/// Polls the device on every scrape and reports the cached snapshot.
pub struct HerpstatCollector<S, C> {
    coordinator: PollCoordinator<S, C>,
    descriptors: Descriptors,
}

/// A collector talking to a real device over HTTP.
pub type DeviceCollector = HerpstatCollector<HttpStatusSource, TokioClock>;

impl DeviceCollector {
    /// Validate `config` and build a collector for that device.
    pub fn for_device(config: &DeviceConfig) -> Result<Self> {
        config.validate()?;

        let span = info_span!("herpstat", device = %config.address);
        let source = HttpStatusSource::new(config)?;
        Ok(Self::new(PollCoordinator::new(source, TokioClock, config, span)))
    }
}

impl<S: StatusSource, C: Clock> HerpstatCollector<S, C> {
    pub fn new(coordinator: PollCoordinator<S, C>) -> Self {
        Self {
            coordinator,
            descriptors: Descriptors::new(),
        }
    }

    pub fn cache(&self) -> Arc<SnapshotCache> {
        self.coordinator.cache()
    }

    /// Ask the device for fresh data, then build families from whatever the
    /// cache holds afterwards.
    pub async fn collect(&mut self) -> Vec<MetricFamily> {
        let outcome = self.coordinator.poll_outcome().await;
        if !outcome.is_success() {
            warn!("Returning previously cached data.");
        }

        let snapshot = self.coordinator.cache().current();
        snapshot_families(&self.descriptors, &snapshot, outcome)
    }

    /// [`collect`](Self::collect) rendered in the text exposition format.
    pub async fn scrape(&mut self) -> String {
        encode(&self.collect().await)
    }
}

/// A reading if it lies inside `range`, otherwise `None`.
pub fn within(value: f64, range: &RangeInclusive<f64>) -> Option<f64> {
    range.contains(&value).then_some(value)
}

fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// Build every family for one scrape.
///
/// Device families are left out until the first snapshot lands, and only
/// outputs the device actually reported are exported.
pub fn snapshot_families(
    d: &Descriptors,
    snapshot: &Snapshot,
    outcome: PollOutcome,
) -> Vec<MetricFamily> {
    let mut up = MetricFamily::new(&d.up);
    up.push(&[], flag(outcome.is_success() && snapshot.is_populated()));

    let Some(fetched_at) = snapshot.fetched_at else {
        debug!("no snapshot cached yet, exporting up only");
        return vec![up];
    };

    let mut last_success = MetricFamily::new(&d.last_success);
    last_success.push(&[], fetched_at.timestamp_millis() as f64 / 1000.0);

    let system = &snapshot.system;
    let name = system.name.as_str();
    let output_count = format!("{:.0}", system.output_count);
    let firmware = system.firmware_label();

    let mut info = MetricFamily::new(&d.info);
    info.push(
        &[
            name,
            system.ip.as_str(),
            system.mac.as_str(),
            firmware.as_str(),
            output_count.as_str(),
        ],
        1.0,
    );

    let mut temp = MetricFamily::new(&d.temp);
    temp.push(&[name], system.temp);

    let mut safety_relay = MetricFamily::new(&d.safety_relay);
    safety_relay.push(
        &[name, system.safety_relay.as_str()],
        flag(system.safety_relay_tripped()),
    );

    let mut resets = MetricFamily::new(&d.resets);
    resets.push(&[name], system.power_resets);

    let mut output_info = MetricFamily::new(&d.output_info);
    let mut power = MetricFamily::new(&d.output_power);
    let mut power_limit = MetricFamily::new(&d.output_power_limit);
    let mut probe_temp = MetricFamily::new(&d.output_probe_temp);
    let mut probe_humidity = MetricFamily::new(&d.output_probe_humidity);
    let mut alarm_enabled = MetricFamily::new(&d.output_alarm_enabled);
    let mut alarm_high = MetricFamily::new(&d.output_alarm_high);
    let mut alarm_low = MetricFamily::new(&d.output_alarm_low);
    let mut ramping = MetricFamily::new(&d.output_ramping);
    let mut ramp_end = MetricFamily::new(&d.output_ramp_end);
    let mut error = MetricFamily::new(&d.output_error);

    for output in snapshot.reported_outputs() {
        let id = output.id.as_str();
        let labels = [name, id];

        output_info.push(&[name, id, output.name.as_str(), output.mode.as_str()], 1.0);
        power.push(&labels, output.power);
        power_limit.push(&labels, output.power_limit);

        match within(output.probe_temp, &TEMPERATURE_RANGE) {
            Some(value) => probe_temp.push(&labels, value),
            None => debug!(id, value = output.probe_temp, "probe temperature out of range, skipping"),
        }
        match within(output.probe_humidity, &HUMIDITY_RANGE) {
            Some(value) => probe_humidity.push(&labels, value),
            None => debug!(id, value = output.probe_humidity, "probe humidity out of range, skipping"),
        }

        alarm_enabled.push(&labels, output.alarm_enabled);
        alarm_high.push(&labels, output.alarm_high);
        alarm_low.push(&labels, output.alarm_low);
        ramping.push(&labels, flag(output.is_ramping()));
        ramp_end.push(&labels, output.ramp_end);
        error.push(&[name, id, output.error_description.as_str()], output.error_code);
    }

    vec![
        up,
        last_success,
        info,
        temp,
        safety_relay,
        resets,
        output_info,
        power,
        power_limit,
        probe_temp,
        probe_humidity,
        alarm_enabled,
        alarm_high,
        alarm_low,
        ramping,
        ramp_end,
        error,
    ]
}
