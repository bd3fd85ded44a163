//! Prometheus text exposition format (version 0.0.4).

use crate::metrics::descriptors::Desc;

/// Content type of [`encode`]'s output.
pub const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// One labeled value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label_values: Vec<String>,
    pub value: f64,
}

/// All samples of one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub desc: Desc,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(desc: &Desc) -> Self {
        Self {
            desc: desc.clone(),
            samples: Vec::new(),
        }
    }

    /// Add a sample. `label_values` lines up with `desc.labels`.
    pub fn push(&mut self, label_values: &[&str], value: f64) {
        debug_assert_eq!(label_values.len(), self.desc.labels.len());
        self.samples.push(Sample {
            label_values: label_values.iter().map(|v| v.to_string()).collect(),
            value,
        });
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }
}

/// Render families in exposition order. Families without samples are left
/// out entirely.
pub fn encode(families: &[MetricFamily]) -> String {
    let mut out = String::new();

    for family in families.iter().filter(|f| !f.samples.is_empty()) {
        let desc = &family.desc;
        out.push_str(&format!("# HELP {} {}\n", desc.name, escape_help(desc.help)));
        out.push_str(&format!("# TYPE {} {}\n", desc.name, desc.kind.as_str()));

        for sample in &family.samples {
            out.push_str(&desc.name);
            if !desc.labels.is_empty() {
                let labels = desc
                    .labels
                    .iter()
                    .zip(&sample.label_values)
                    .map(|(name, value)| format!("{}=\"{}\"", name, escape_label_value(value)))
                    .collect::<Vec<_>>()
                    .join(",");
                out.push('{');
                out.push_str(&labels);
                out.push('}');
            }
            out.push(' ');
            out.push_str(&format_value(sample.value));
            out.push('\n');
        }
    }

    out
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}
