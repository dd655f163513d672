//! Threshold definitions
//!
//! A threshold pairs a metric selector (`http_req_duration{name:auth}`) with a
//! condition (`p(95)<800`). Both halves use the k6 textual form
//! so they can also be supplied on the command line.

use std::fmt;
use std::str::FromStr;

use crate::error::{LoadTestError, Result};

/// Metrics a threshold can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    /// Share of requests with a status outside 200-399 or a transport error
    HttpReqFailed,
    /// Request duration in milliseconds
    HttpReqDuration,
    /// Full scenario iteration duration in milliseconds
    IterationDuration,
    /// Share of passing checks
    Checks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Rate,
    Trend,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::HttpReqFailed => "http_req_failed",
            MetricName::HttpReqDuration => "http_req_duration",
            MetricName::IterationDuration => "iteration_duration",
            MetricName::Checks => "checks",
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            MetricName::HttpReqFailed | MetricName::Checks => MetricKind::Rate,
            MetricName::HttpReqDuration | MetricName::IterationDuration => MetricKind::Trend,
        }
    }

    /// Whether the metric is recorded per request tag
    pub fn supports_tag(&self) -> bool {
        matches!(self, MetricName::HttpReqFailed | MetricName::HttpReqDuration)
    }
}

impl FromStr for MetricName {
    type Err = LoadTestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http_req_failed" => Ok(MetricName::HttpReqFailed),
            "http_req_duration" => Ok(MetricName::HttpReqDuration),
            "iteration_duration" => Ok(MetricName::IterationDuration),
            "checks" => Ok(MetricName::Checks),
            other => Err(LoadTestError::invalid_threshold(other, "unknown metric")),
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    Rate,
    Count,
    Avg,
    Min,
    Max,
    Med,
    /// Percentile in `(0, 100]`
    Percentile(f64),
}

impl Aggregation {
    fn valid_for(&self, kind: MetricKind) -> bool {
        match self {
            Aggregation::Rate => kind == MetricKind::Rate,
            Aggregation::Count => true,
            _ => kind == MetricKind::Trend,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Rate => f.write_str("rate"),
            Aggregation::Count => f.write_str("count"),
            Aggregation::Avg => f.write_str("avg"),
            Aggregation::Min => f.write_str("min"),
            Aggregation::Max => f.write_str("max"),
            Aggregation::Med => f.write_str("med"),
            Aggregation::Percentile(p) => write!(f, "p({p})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    pub fn holds(&self, observed: f64, limit: f64) -> bool {
        match self {
            Comparison::Lt => observed < limit,
            Comparison::Le => observed <= limit,
            Comparison::Gt => observed > limit,
            Comparison::Ge => observed >= limit,
            Comparison::Eq => observed == limit,
            Comparison::Ne => observed != limit,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        }
    }
}

/// `<aggregation> <op> <value>`, e.g. `p(95)<800` or `rate<0.05`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    pub aggregation: Aggregation,
    pub comparison: Comparison,
    pub value: f64,
}

impl Condition {
    pub const fn new(aggregation: Aggregation, comparison: Comparison, value: f64) -> Self {
        Self {
            aggregation,
            comparison,
            value,
        }
    }
}

impl FromStr for Condition {
    type Err = LoadTestError;

    fn from_str(s: &str) -> Result<Self> {
        let expr: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let invalid = |reason: &str| LoadTestError::invalid_threshold(s, reason);

        // Two-character operators first so `<=` is not read as `<`
        let (split_at, comparison, op_len) = ["<=", ">=", "==", "!=", "<", ">"]
            .iter()
            .find_map(|op| {
                expr.find(op).map(|idx| {
                    let comparison = match *op {
                        "<=" => Comparison::Le,
                        ">=" => Comparison::Ge,
                        "==" => Comparison::Eq,
                        "!=" => Comparison::Ne,
                        "<" => Comparison::Lt,
                        _ => Comparison::Gt,
                    };
                    (idx, comparison, op.len())
                })
            })
            .ok_or_else(|| invalid("missing comparison operator"))?;

        let (lhs, rhs) = (&expr[..split_at], &expr[split_at + op_len..]);

        let aggregation = match lhs {
            "rate" => Aggregation::Rate,
            "count" => Aggregation::Count,
            "avg" => Aggregation::Avg,
            "min" => Aggregation::Min,
            "max" => Aggregation::Max,
            "med" => Aggregation::Med,
            other => {
                let inner = other
                    .strip_prefix("p(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .ok_or_else(|| invalid("unknown aggregation"))?;
                let p: f64 = inner.parse().map_err(|_| invalid("percentile is not a number"))?;
                if !(p > 0.0 && p <= 100.0) {
                    return Err(invalid("percentile must be in (0, 100]"));
                }
                Aggregation::Percentile(p)
            }
        };

        let value: f64 = rhs.parse().map_err(|_| invalid("limit is not a number"))?;

        Ok(Condition::new(aggregation, comparison, value))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.aggregation, self.comparison.symbol(), self.value)
    }
}

/// A pass/fail criterion evaluated over the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    pub metric: MetricName,
    /// Restricts the metric to requests carrying this `name` tag
    pub tag: Option<String>,
    pub condition: Condition,
}

impl Threshold {
    pub fn new(metric: MetricName, tag: Option<&str>, condition: Condition) -> Result<Self> {
        let threshold = Self {
            metric,
            tag: tag.map(str::to_string),
            condition,
        };

        if threshold.tag.is_some() && !metric.supports_tag() {
            return Err(LoadTestError::invalid_threshold(
                threshold.to_string(),
                "metric is not tagged per request",
            ));
        }
        if !condition.aggregation.valid_for(metric.kind()) {
            return Err(LoadTestError::invalid_threshold(
                threshold.to_string(),
                format!("'{}' does not apply to {}", condition.aggregation, metric),
            ));
        }

        Ok(threshold)
    }

    /// Parse a selector such as `http_req_duration{name:menu}` and a condition.
    pub fn parse(selector: &str, condition: &str) -> Result<Self> {
        let selector = selector.trim();
        let (metric, tag) = match selector.split_once('{') {
            None => (selector, None),
            Some((metric, rest)) => {
                let filter = rest.strip_suffix('}').ok_or_else(|| {
                    LoadTestError::invalid_threshold(selector, "unterminated tag filter")
                })?;
                let (key, value) = filter.split_once(':').ok_or_else(|| {
                    LoadTestError::invalid_threshold(selector, "tag filter must be key:value")
                })?;
                if key.trim() != "name" {
                    return Err(LoadTestError::invalid_threshold(
                        selector,
                        "only the 'name' tag can be filtered",
                    ));
                }
                (metric, Some(value.trim()))
            }
        };

        Threshold::new(metric.trim().parse()?, tag, condition.parse()?)
    }

    /// Parse the command-line form `SELECTOR=CONDITION`.
    pub fn parse_assignment(raw: &str) -> Result<Self> {
        let (selector, condition) = raw
            .split_once('=')
            .ok_or_else(|| LoadTestError::invalid_threshold(raw, "expected SELECTOR=CONDITION"))?;
        Threshold::parse(selector, condition)
    }

    pub fn selector(&self) -> String {
        match &self.tag {
            Some(tag) => format!("{}{{name:{}}}", self.metric, tag),
            None => self.metric.to_string(),
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.selector(), self.condition)
    }
}

fn p95_below(tag: &str, limit_ms: f64) -> Threshold {
    Threshold {
        metric: MetricName::HttpReqDuration,
        tag: Some(tag.to_string()),
        condition: Condition::new(Aggregation::Percentile(95.0), Comparison::Lt, limit_ms),
    }
}

/// Thresholds for the food-ordering scenario
///
/// - fewer than 5% failed requests
/// - p(90) request duration under 500ms across all services
/// - p(95) per service: auth 800ms, menu 400ms, search 300ms, order 600ms
pub fn default_thresholds() -> Vec<Threshold> {
    vec![
        Threshold {
            metric: MetricName::HttpReqFailed,
            tag: None,
            condition: Condition::new(Aggregation::Rate, Comparison::Lt, 0.05),
        },
        Threshold {
            metric: MetricName::HttpReqDuration,
            tag: None,
            condition: Condition::new(Aggregation::Percentile(90.0), Comparison::Lt, 500.0),
        },
        p95_below("auth", 800.0),
        p95_below("menu", 400.0),
        p95_below("search", 300.0),
        p95_below("order", 600.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conditions() {
        let c: Condition = "p(95)<800".parse().unwrap();
        assert_eq!(c, Condition::new(Aggregation::Percentile(95.0), Comparison::Lt, 800.0));

        let c: Condition = "rate < 0.05".parse().unwrap();
        assert_eq!(c, Condition::new(Aggregation::Rate, Comparison::Lt, 0.05));

        let c: Condition = "avg<=120.5".parse().unwrap();
        assert_eq!(c, Condition::new(Aggregation::Avg, Comparison::Le, 120.5));

        let c: Condition = "p(99.9)>=1".parse().unwrap();
        assert_eq!(c.aggregation, Aggregation::Percentile(99.9));
        assert_eq!(c.comparison, Comparison::Ge);
    }

    #[test]
    fn test_parse_condition_errors() {
        assert!("p95<800".parse::<Condition>().is_err());
        assert!("p(0)<800".parse::<Condition>().is_err());
        assert!("p(101)<800".parse::<Condition>().is_err());
        assert!("p(95)800".parse::<Condition>().is_err());
        assert!("p(95)<fast".parse::<Condition>().is_err());
        assert!("median<10".parse::<Condition>().is_err());
    }

    #[test]
    fn test_parse_selectors() {
        let t = Threshold::parse("http_req_duration{name:auth}", "p(95)<800").unwrap();
        assert_eq!(t.metric, MetricName::HttpReqDuration);
        assert_eq!(t.tag.as_deref(), Some("auth"));
        assert_eq!(t.to_string(), "http_req_duration{name:auth}: p(95)<800");

        let t = Threshold::parse("http_req_failed", "rate<0.05").unwrap();
        assert_eq!(t.tag, None);
        assert_eq!(t.selector(), "http_req_failed");
    }

    #[test]
    fn test_parse_selector_errors() {
        assert!(Threshold::parse("http_req_duration{name:auth", "p(95)<800").is_err());
        assert!(Threshold::parse("http_req_duration{method:GET}", "p(95)<800").is_err());
        assert!(Threshold::parse("data_received", "count<10").is_err());
        // checks are not tagged per request
        assert!(Threshold::parse("checks{name:auth}", "rate>0.9").is_err());
    }

    #[test]
    fn test_aggregation_must_match_metric_kind() {
        assert!(Threshold::parse("http_req_failed", "p(95)<0.05").is_err());
        assert!(Threshold::parse("http_req_duration", "rate<0.05").is_err());
        assert!(Threshold::parse("checks", "rate>0.99").is_ok());
        assert!(Threshold::parse("iteration_duration", "max<10000").is_ok());
    }

    #[test]
    fn test_parse_assignment() {
        let t = Threshold::parse_assignment("http_req_duration{name:order}=p(99)<=1500").unwrap();
        assert_eq!(t.tag.as_deref(), Some("order"));
        assert_eq!(t.condition.comparison, Comparison::Le);
        assert_eq!(t.condition.value, 1500.0);

        assert!(Threshold::parse_assignment("http_req_duration p(99)<1500").is_err());
    }

    #[test]
    fn test_default_thresholds_round_trip_through_parser() {
        let defaults = default_thresholds();
        assert_eq!(defaults.len(), 6);

        for threshold in &defaults {
            let text = threshold.to_string();
            let (selector, condition) = text.split_once(": ").unwrap();
            assert_eq!(&Threshold::parse(selector, condition).unwrap(), threshold);
        }
    }

    #[test]
    fn test_comparison_holds() {
        assert!(Comparison::Lt.holds(299.0, 300.0));
        assert!(!Comparison::Lt.holds(300.0, 300.0));
        assert!(Comparison::Le.holds(300.0, 300.0));
        assert!(Comparison::Ne.holds(1.0, 2.0));
    }
}
