//! Names, help text and label sets of every exported metric.

/// Prefix of every metric name.
pub const NAMESPACE: &str = "herpstat";

const SYSTEM_LABELS: &[&str] = &["name"];
const SYSTEM_SAFETY_RELAY_LABELS: &[&str] = &["name", "relay"];
const SYSTEM_INFO_LABELS: &[&str] = &["name", "ip", "mac", "firmware", "outputs"];

const OUTPUT_LABELS: &[&str] = &["system", "id"];
const OUTPUT_INFO_LABELS: &[&str] = &["system", "id", "name", "mode"];
const OUTPUT_ERROR_LABELS: &[&str] = &["system", "id", "error"];

/// Exposition type of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Describes one metric family.
#[derive(Debug, Clone, PartialEq)]
pub struct Desc {
    pub name: String,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
}

/// Build `namespace_subsystem_name`, skipping empty parts.
pub fn fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

fn desc(
    subsystem: &str,
    name: &str,
    help: &'static str,
    kind: MetricKind,
    labels: &'static [&'static str],
) -> Desc {
    Desc {
        name: fq_name(NAMESPACE, subsystem, name),
        help,
        kind,
        labels,
    }
}

fn system_gauge(name: &str, help: &'static str) -> Desc {
    desc("system", name, help, MetricKind::Gauge, SYSTEM_LABELS)
}

fn output_gauge(name: &str, help: &'static str) -> Desc {
    desc("output", name, help, MetricKind::Gauge, OUTPUT_LABELS)
}

/// Every descriptor the exporter emits.
#[derive(Debug, Clone)]
pub struct Descriptors {
    pub up: Desc,
    pub last_success: Desc,
    pub info: Desc,
    pub temp: Desc,
    pub safety_relay: Desc,
    pub resets: Desc,
    pub output_info: Desc,
    pub output_power: Desc,
    pub output_power_limit: Desc,
    pub output_probe_temp: Desc,
    pub output_probe_humidity: Desc,
    pub output_alarm_enabled: Desc,
    pub output_alarm_high: Desc,
    pub output_alarm_low: Desc,
    pub output_ramping: Desc,
    pub output_ramp_end: Desc,
    pub output_error: Desc,
}

impl Descriptors {
    pub fn new() -> Self {
        Self {
            up: desc(
                "",
                "up",
                "Whether the last scrape was served from valid device data.",
                MetricKind::Gauge,
                &[],
            ),
            last_success: desc(
                "",
                "last_poll_success_timestamp_seconds",
                "Unix time of the last successful device poll.",
                MetricKind::Gauge,
                &[],
            ),
            info: desc(
                "system",
                "info",
                "Information about the Herpstat system itself.",
                MetricKind::Counter,
                SYSTEM_INFO_LABELS,
            ),
            temp: system_gauge("temp", "Current internal temperature."),
            safety_relay: desc(
                "system",
                "safetyrelay",
                "Safety relay status.",
                MetricKind::Gauge,
                SYSTEM_SAFETY_RELAY_LABELS,
            ),
            resets: system_gauge("reset_total", "Number of times Herpstat has reset"),
            output_info: desc(
                "output",
                "info",
                "metadata about the output",
                MetricKind::Counter,
                OUTPUT_INFO_LABELS,
            ),
            output_power: output_gauge("power", "Current output power level."),
            output_power_limit: output_gauge("power_limit", "Current output power limit."),
            output_probe_temp: output_gauge("probe_temperature", "Current probe temperature."),
            output_probe_humidity: output_gauge("probe_humidity", "Current probe humidity level."),
            output_alarm_enabled: output_gauge("alarm_enabled", "Output alarm enabled."),
            output_alarm_high: output_gauge("alarm_high", "Output Alarm high value."),
            output_alarm_low: output_gauge("alarm_low", "Output Alarm low value."),
            output_ramping: output_gauge("ramping", "Currently ramping?"),
            output_ramp_end: output_gauge("ramp_end", "Ramp end value."),
            output_error: desc(
                "output",
                "error",
                "Error Code.",
                MetricKind::Gauge,
                OUTPUT_ERROR_LABELS,
            ),
        }
    }
}

impl Default for Descriptors {
    fn default() -> Self {
        Self::new()
    }
}
