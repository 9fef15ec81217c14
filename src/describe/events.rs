use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event;
use std::cmp::Ordering;

use super::Describer;
use crate::error::Result;
use crate::models::DescribeEvent;

/// Last-seen, then event time, then first-seen.
pub fn resolve_event_time(event: &Event) -> Option<DateTime<Utc>> {
    event
        .last_timestamp
        .as_ref()
        .map(|t| t.0)
        .or_else(|| event.event_time.as_ref().map(|t| t.0))
        .or_else(|| event.first_timestamp.as_ref().map(|t| t.0))
}

fn event_source(event: &Event) -> String {
    event
        .source
        .as_ref()
        .and_then(|s| s.component.clone())
        .or_else(|| event.reporting_component.clone())
        .unwrap_or_default()
}

fn to_describe_event(event: &Event) -> DescribeEvent {
    DescribeEvent {
        time: resolve_event_time(event),
        type_: event.type_.clone().unwrap_or_default(),
        reason: event.reason.clone().unwrap_or_default(),
        source: event_source(event),
        message: event.message.clone().unwrap_or_default(),
    }
}

/// Newest first; events with no timestamp at all go last.
fn newest_first(a: &DescribeEvent, b: &DescribeEvent) -> Ordering {
    match (a.time, b.time) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl Describer {
    /// Events whose involved object has `uid`, newest first. `None` namespace searches all.
    pub async fn events(&self, namespace: Option<&str>, uid: &str) -> Result<Vec<DescribeEvent>> {
        if uid.is_empty() {
            return Ok(Vec::new());
        }
        let selector = format!("involvedObject.uid={}", uid);
        let items = self.reader.list_events(namespace, &selector).await?;

        let mut events: Vec<DescribeEvent> = items
            .iter()
            .filter(|e| e.involved_object.uid.as_deref() == Some(uid))
            .map(to_describe_event)
            .collect();
        events.sort_by(newest_first);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::fake::{obj, FakeReader};
    use serde_json::json;
    use std::sync::Arc;

    fn event(name: &str, uid: &str, times: serde_json::Value) -> Event {
        let mut value = json!({
            "metadata": {"name": name, "namespace": "default"},
            "involvedObject": {"kind": "Pod", "name": "api", "uid": uid},
            "reason": name,
            "type": "Normal",
            "message": format!("{} happened", name),
            "source": {"component": "kubelet"}
        });
        for (k, v) in times.as_object().unwrap() {
            value[k] = v.clone();
        }
        obj(value)
    }

    #[tokio::test]
    async fn test_events_newest_first_untimed_last() {
        let reader = FakeReader {
            events: vec![
                event("untimed", "u1", json!({})),
                event("t1", "u1", json!({"lastTimestamp": "2024-05-01T10:00:00Z"})),
                event("t2", "u1", json!({"lastTimestamp": "2024-05-01T11:00:00Z"})),
            ],
            ..Default::default()
        };
        let d = Describer::new(Arc::new(reader), None);
        let events = d.events(Some("default"), "u1").await.unwrap();

        let reasons: Vec<&str> = events.iter().map(|e| e.reason.as_str()).collect();
        assert_eq!(reasons, vec!["t2", "t1", "untimed"]);
        assert!(events[2].time.is_none());
        assert_eq!(events[0].source, "kubelet");
    }

    #[tokio::test]
    async fn test_events_filtered_by_involved_uid() {
        let reader = FakeReader {
            events: vec![
                event("mine", "u1", json!({"lastTimestamp": "2024-05-01T10:00:00Z"})),
                event("theirs", "u2", json!({"lastTimestamp": "2024-05-01T10:00:00Z"})),
            ],
            ..Default::default()
        };
        let reader = Arc::new(reader);
        let d = Describer::new(reader.clone(), None);
        let events = d.events(None, "u1").await.unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason, "mine");
        assert_eq!(reader.selectors.lock().unwrap().as_slice(), ["involvedObject.uid=u1"]);
    }

    #[tokio::test]
    async fn test_no_matching_events_is_empty() {
        let d = Describer::new(Arc::new(FakeReader::default()), None);
        assert!(d.events(Some("default"), "nothing").await.unwrap().is_empty());
        assert!(d.events(Some("default"), "").await.unwrap().is_empty());
    }

    #[test]
    fn test_time_fallback_priority() {
        let e = event(
            "x",
            "u",
            json!({"firstTimestamp": "2024-05-01T08:00:00Z", "eventTime": "2024-05-01T09:00:00.000000Z"}),
        );
        assert_eq!(resolve_event_time(&e).unwrap().to_rfc3339(), "2024-05-01T09:00:00+00:00");

        let e = event("x", "u", json!({"firstTimestamp": "2024-05-01T08:00:00Z"}));
        assert_eq!(resolve_event_time(&e).unwrap().to_rfc3339(), "2024-05-01T08:00:00+00:00");

        let e = event(
            "x",
            "u",
            json!({"lastTimestamp": "2024-05-01T10:00:00Z", "eventTime": "2024-05-01T09:00:00.000000Z"}),
        );
        assert_eq!(resolve_event_time(&e).unwrap().to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }
}
