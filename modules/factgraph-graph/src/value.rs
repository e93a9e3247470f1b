use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use serde_json::{Map, Number, Value};

/// Store-agnostic value carried in statement parameters and result records.
///
/// Temporal variants keep the store's native type until [`GraphValue::to_json`]
/// renders them for callers.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<GraphValue>),
    Map(BTreeMap<String, GraphValue>),
    DateTime(DateTime<FixedOffset>),
    /// Wall-clock time in a named zone. `offset` is the zone's offset at that
    /// instant, when the zone id is known.
    ZonedDateTime {
        local: NaiveDateTime,
        offset: Option<FixedOffset>,
        zone: String,
    },
    LocalDateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime, FixedOffset),
    LocalTime(NaiveTime),
    Duration(Duration),
}

const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

impl GraphValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            GraphValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[GraphValue]> {
        match self {
            GraphValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, GraphValue>> {
        match self {
            GraphValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Render as JSON. Temporal values become ISO-8601 strings, recursively
    /// through lists and maps; everything else maps one-to-one.
    pub fn to_json(&self) -> Value {
        match self {
            GraphValue::Null => Value::Null,
            GraphValue::Bool(b) => Value::Bool(*b),
            GraphValue::Int(i) => Value::Number((*i).into()),
            GraphValue::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            GraphValue::String(s) => Value::String(s.clone()),
            GraphValue::List(items) => Value::Array(items.iter().map(GraphValue::to_json).collect()),
            GraphValue::Map(m) => Value::Object(map_to_json(m)),
            GraphValue::DateTime(dt) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            GraphValue::ZonedDateTime { local, offset, zone } => {
                let offset = offset.map(|o| o.to_string()).unwrap_or_default();
                Value::String(format!("{}{offset}[{zone}]", local.format(LOCAL_DATETIME_FORMAT)))
            }
            GraphValue::LocalDateTime(dt) => {
                Value::String(dt.format(LOCAL_DATETIME_FORMAT).to_string())
            }
            GraphValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            GraphValue::Time(t, offset) => {
                Value::String(format!("{}{offset}", t.format(TIME_FORMAT)))
            }
            GraphValue::LocalTime(t) => Value::String(t.format(TIME_FORMAT).to_string()),
            GraphValue::Duration(d) => Value::String(iso_duration(*d)),
        }
    }
}

/// `PT<seconds>S`, with a trimmed fraction when there are nanoseconds.
fn iso_duration(d: Duration) -> String {
    let nanos = d.subsec_nanos();
    if nanos == 0 {
        return format!("PT{}S", d.as_secs());
    }
    let fraction = format!("{nanos:09}");
    format!("PT{}.{}S", d.as_secs(), fraction.trim_end_matches('0'))
}

/// JSON object from a property map, with temporal values rendered.
pub fn map_to_json(map: &BTreeMap<String, GraphValue>) -> Map<String, Value> {
    map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
}

impl From<&str> for GraphValue {
    fn from(s: &str) -> Self {
        GraphValue::String(s.to_string())
    }
}

impl From<String> for GraphValue {
    fn from(s: String) -> Self {
        GraphValue::String(s)
    }
}

impl From<bool> for GraphValue {
    fn from(b: bool) -> Self {
        GraphValue::Bool(b)
    }
}

impl From<i64> for GraphValue {
    fn from(i: i64) -> Self {
        GraphValue::Int(i)
    }
}

impl From<f64> for GraphValue {
    fn from(f: f64) -> Self {
        GraphValue::Float(f)
    }
}

impl From<Vec<String>> for GraphValue {
    fn from(items: Vec<String>) -> Self {
        GraphValue::List(items.into_iter().map(GraphValue::String).collect())
    }
}

impl<T: Into<GraphValue>> From<Option<T>> for GraphValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(GraphValue::Null)
    }
}

impl From<DateTime<FixedOffset>> for GraphValue {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        GraphValue::DateTime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn utc(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn datetimes_render_as_iso_strings() {
        let v = GraphValue::DateTime(utc("2024-03-01T10:15:30Z"));
        assert_eq!(v.to_json(), json!("2024-03-01T10:15:30Z"));

        let local = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 15, 30)
            .unwrap();
        assert_eq!(
            GraphValue::LocalDateTime(local).to_json(),
            json!("2024-03-01T10:15:30")
        );
        assert_eq!(
            GraphValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).to_json(),
            json!("2024-03-01")
        );
    }

    #[test]
    fn zoned_times_and_durations_render_as_iso_strings() {
        let local = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let zoned = GraphValue::ZonedDateTime {
            local,
            offset: FixedOffset::east_opt(3600),
            zone: "Europe/Berlin".into(),
        };
        assert_eq!(zoned.to_json(), json!("2024-01-15T10:00:00+01:00[Europe/Berlin]"));

        let unresolved = GraphValue::ZonedDateTime {
            local,
            offset: None,
            zone: "Mars/Olympus".into(),
        };
        assert_eq!(unresolved.to_json(), json!("2024-01-15T10:00:00[Mars/Olympus]"));

        let t = NaiveTime::from_hms_milli_opt(7, 8, 9, 500).unwrap();
        assert_eq!(
            GraphValue::Time(t, FixedOffset::east_opt(-5 * 3600).unwrap()).to_json(),
            json!("07:08:09.500-05:00")
        );
        assert_eq!(GraphValue::LocalTime(t).to_json(), json!("07:08:09.500"));

        assert_eq!(GraphValue::Duration(Duration::from_secs(90)).to_json(), json!("PT90S"));
        assert_eq!(
            GraphValue::Duration(Duration::from_millis(1_250)).to_json(),
            json!("PT1.25S")
        );
    }

    #[test]
    fn temporal_values_nested_in_maps_and_lists_are_rendered() {
        let mut props = BTreeMap::new();
        props.insert("createdAt".to_string(), GraphValue::DateTime(utc("2024-01-02T03:04:05+02:00")));
        props.insert(
            "history".to_string(),
            GraphValue::List(vec![GraphValue::DateTime(utc("2023-12-31T23:59:59Z")), GraphValue::Int(3)]),
        );
        props.insert("content".to_string(), "hello".into());

        assert_eq!(
            GraphValue::Map(props).to_json(),
            json!({
                "createdAt": "2024-01-02T03:04:05+02:00",
                "history": ["2023-12-31T23:59:59Z", 3],
                "content": "hello",
            })
        );
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(GraphValue::Null.to_json(), json!(null));
        assert_eq!(GraphValue::Bool(true).to_json(), json!(true));
        assert_eq!(GraphValue::Float(1.5).to_json(), json!(1.5));
        assert_eq!(GraphValue::from(None::<String>), GraphValue::Null);
        assert_eq!(
            GraphValue::from(vec!["a".to_string()]),
            GraphValue::List(vec![GraphValue::String("a".into())])
        );
    }
}
