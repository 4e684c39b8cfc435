//! Prometheus text exposition format (version 0.0.4).

use std::fmt::Write;

use super::family::{MetricFamily, MetricSample, SampleKind};

/// `Content-Type` for the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Encode families in the given order, one blank line between families.
pub fn encode(families: &[MetricFamily]) -> String {
    let mut out = String::new();
    encode_into(&mut out, families);
    out
}

pub fn encode_into(out: &mut String, families: &[MetricFamily]) {
    for (i, fam) in families.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        encode_family(out, fam);
    }
}

fn encode_family(out: &mut String, fam: &MetricFamily) {
    let _ = writeln!(out, "# HELP {} {}", fam.name(), escape_help(fam.help()));
    let _ = writeln!(out, "# TYPE {} {}", fam.name(), fam.kind());
    for sample in fam.samples() {
        encode_sample(out, fam.name(), sample);
    }
}

fn encode_sample(out: &mut String, name: &str, sample: &MetricSample) {
    out.push_str(name);
    out.push_str(sample.kind.suffix());

    // BTreeMap order, with `le` always last.
    let mut pairs: Vec<String> = sample
        .labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect();
    if let SampleKind::Bucket { le } = sample.kind {
        pairs.push(format!("le=\"{}\"", format_value(le)));
    }
    if !pairs.is_empty() {
        let _ = write!(out, "{{{}}}", pairs.join(","));
    }

    let _ = writeln!(out, " {}", format_value(sample.value));
}

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Integral values print without a fractional part (`3`, not `3.0`).
pub(crate) fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposition::family::Histogram;

    #[test]
    fn value_formatting() {
        assert_eq!(format_value(3.0), "3");
        assert_eq!(format_value(0.25), "0.25");
        assert_eq!(format_value(-1.0), "-1");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(f64::NAN), "NaN");
    }

    #[test]
    fn labels_render_alphabetically() {
        let mut fam = MetricFamily::counter("http_requests_total", "The total number of HTTP requests.").unwrap();
        fam.push_counter([("status", "200"), ("method", "GET"), ("route", "/")], 7.0).unwrap();

        let text = encode(&[fam]);
        assert_eq!(
            text,
            "# HELP http_requests_total The total number of HTTP requests.\n\
             # TYPE http_requests_total counter\n\
             http_requests_total{method=\"GET\",route=\"/\",status=\"200\"} 7\n"
        );
    }

    #[test]
    fn unlabeled_sample_has_no_braces() {
        let mut fam = MetricFamily::gauge("process_uptime_seconds", "Uptime.").unwrap();
        fam.push_gauge(std::iter::empty::<(&str, &str)>(), 1.5).unwrap();
        assert!(encode(&[fam]).ends_with("process_uptime_seconds 1.5\n"));
    }

    #[test]
    fn label_values_and_help_are_escaped() {
        let mut fam = MetricFamily::gauge("info", "line one\nline \\two").unwrap();
        fam.push_gauge([("v", "a\"b\\c\nd")], 1.0).unwrap();
        let text = encode(&[fam]);
        assert!(text.contains("# HELP info line one\\nline \\\\two\n"));
        assert!(text.contains("info{v=\"a\\\"b\\\\c\\nd\"} 1\n"));
    }

    #[test]
    fn histogram_puts_le_last() {
        let hist = Histogram::new(vec![(0.1, 1), (1.0, 2)], 0.6, 3).unwrap();
        let mut fam = MetricFamily::histogram("req_seconds", "Latency.").unwrap();
        fam.push_histogram([("route", "/"), ("method", "GET")], &hist).unwrap();

        let text = encode(&[fam]);
        let expected = "# HELP req_seconds Latency.\n\
                        # TYPE req_seconds histogram\n\
                        req_seconds_bucket{method=\"GET\",route=\"/\",le=\"0.1\"} 1\n\
                        req_seconds_bucket{method=\"GET\",route=\"/\",le=\"1\"} 2\n\
                        req_seconds_bucket{method=\"GET\",route=\"/\",le=\"+Inf\"} 3\n\
                        req_seconds_sum{method=\"GET\",route=\"/\"} 0.6\n\
                        req_seconds_count{method=\"GET\",route=\"/\"} 3\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn families_are_separated_by_blank_line() {
        let a = MetricFamily::gauge("a", "A.").unwrap();
        let b = MetricFamily::counter("b_total", "B.").unwrap();
        let text = encode(&[a, b]);
        assert_eq!(text, "# HELP a A.\n# TYPE a gauge\n\n# HELP b_total B.\n# TYPE b_total counter\n");
    }
}
