use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use neo4rs::{BoltList, BoltMap, BoltNull, BoltString, BoltType};
use tracing::debug;

use crate::value::GraphValue;

/// Decode a driver value. Temporal types keep their chrono form (durations
/// as `std::time::Duration`); structural types the reader never projects
/// (nodes, paths, points) decode as null.
pub(crate) fn from_bolt(value: BoltType) -> GraphValue {
    match value {
        BoltType::Null(_) => GraphValue::Null,
        BoltType::Boolean(b) => GraphValue::Bool(b.value),
        BoltType::Integer(i) => GraphValue::Int(i.value),
        BoltType::Float(f) => GraphValue::Float(f.value),
        BoltType::String(s) => GraphValue::String(s.value),
        BoltType::List(list) => GraphValue::List(list.value.into_iter().map(from_bolt).collect()),
        BoltType::Map(map) => GraphValue::Map(
            map.value
                .into_iter()
                .map(|(k, v)| (k.value, from_bolt(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
        dt @ BoltType::DateTime(_) => DateTime::<FixedOffset>::try_from(dt)
            .map(GraphValue::DateTime)
            .unwrap_or(GraphValue::Null),
        BoltType::DateTimeZoneId(zoned) => {
            let offset = DateTime::<FixedOffset>::try_from(&zoned)
                .ok()
                .map(|dt| *dt.offset());
            NaiveDateTime::try_from(&zoned)
                .map(|local| GraphValue::ZonedDateTime {
                    local,
                    offset,
                    zone: zoned.tz_id().to_string(),
                })
                .unwrap_or(GraphValue::Null)
        }
        BoltType::Time(t) => {
            let (time, offset): (NaiveTime, FixedOffset) = t.into();
            GraphValue::Time(time, offset)
        }
        BoltType::LocalTime(t) => GraphValue::LocalTime(t.into()),
        BoltType::Duration(d) => GraphValue::Duration(d.into()),
        ldt @ BoltType::LocalDateTime(_) => NaiveDateTime::try_from(ldt)
            .map(GraphValue::LocalDateTime)
            .unwrap_or(GraphValue::Null),
        d @ BoltType::Date(_) => NaiveDate::try_from(d)
            .map(GraphValue::Date)
            .unwrap_or(GraphValue::Null),
        other => {
            debug!(value = ?other, "Unsupported bolt value, decoding as null");
            GraphValue::Null
        }
    }
}

pub(crate) fn to_bolt(value: &GraphValue) -> BoltType {
    match value {
        GraphValue::Null => BoltType::Null(BoltNull),
        GraphValue::Bool(b) => (*b).into(),
        GraphValue::Int(i) => (*i).into(),
        GraphValue::Float(f) => (*f).into(),
        GraphValue::String(s) => BoltType::String(BoltString::from(s.as_str())),
        GraphValue::List(items) => BoltType::List(BoltList {
            value: items.iter().map(to_bolt).collect(),
        }),
        GraphValue::Map(map) => BoltType::Map(BoltMap {
            value: map
                .iter()
                .map(|(k, v)| (BoltString::from(k.as_str()), to_bolt(v)))
                .collect::<HashMap<_, _>>(),
        }),
        GraphValue::DateTime(dt) => (*dt).into(),
        GraphValue::ZonedDateTime { local, zone, .. } => (*local, zone.as_str()).into(),
        GraphValue::LocalDateTime(dt) => (*dt).into(),
        GraphValue::Date(d) => (*d).into(),
        GraphValue::Time(t, offset) => (*t, *offset).into(),
        GraphValue::LocalTime(t) => (*t).into(),
        GraphValue::Duration(d) => (*d).into(),
    }
}
