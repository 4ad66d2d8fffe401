//! Google Calendar v3 integration
//!
//! This module provides:
//! - Calendar client for listing calendars and managing events
//! - Typed events that keep unknown fields across read-modify-write

mod client;

pub use client::CalendarClient;

/// Calendar API request and response types
pub mod api {
    use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::{Map, Value};

    /// The signed-in user's main calendar
    pub const PRIMARY_CALENDAR: &str = "primary";

    /// Response from `calendarList.list`
    #[derive(Debug, Default, Deserialize)]
    pub struct CalendarList {
        #[serde(default)]
        pub items: Vec<CalendarListEntry>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CalendarListEntry {
        pub id: String,
        pub summary: Option<String>,
        pub description: Option<String>,
        pub time_zone: Option<String>,
        #[serde(default)]
        pub primary: bool,
        pub access_role: Option<String>,
    }

    /// Response from `events.list`
    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EventList {
        #[serde(default)]
        pub items: Vec<Event>,
        pub next_page_token: Option<String>,
    }

    /// Calendar event
    ///
    /// Fields not modelled here are kept in `extra` so an update sends them
    /// back unchanged.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Event {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub summary: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub location: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub start: Option<EventDateTime>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub end: Option<EventDateTime>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        pub attendees: Vec<Attendee>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub status: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub html_link: Option<String>,
        #[serde(flatten)]
        pub extra: Map<String, Value>,
    }

    /// Start or end of an event: a timestamp, or a date for all-day events
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EventDateTime {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub date_time: Option<DateTime<FixedOffset>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub time_zone: Option<String>,
    }

    impl EventDateTime {
        /// Timed boundary in UTC
        pub fn utc(at: DateTime<Utc>) -> Self {
            Self {
                date_time: Some(at.fixed_offset()),
                date: None,
                time_zone: Some("UTC".to_string()),
            }
        }

        /// All-day boundary
        pub fn all_day(date: NaiveDate) -> Self {
            Self {
                date_time: None,
                date: Some(date),
                time_zone: None,
            }
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Attendee {
        pub email: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub display_name: Option<String>,
        /// needsAction, declined, tentative or accepted
        #[serde(skip_serializing_if = "Option::is_none")]
        pub response_status: Option<String>,
        #[serde(flatten)]
        pub extra: Map<String, Value>,
    }

    impl Attendee {
        pub fn new(email: impl Into<String>) -> Self {
            Self {
                email: email.into(),
                ..Default::default()
            }
        }
    }

    /// Event to create
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct NewEvent {
        pub summary: String,
        pub start: DateTime<Utc>,
        pub end: DateTime<Utc>,
        pub description: Option<String>,
        pub location: Option<String>,
        /// Attendee email addresses
        pub attendees: Vec<String>,
    }

    impl NewEvent {
        pub fn new(summary: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
            Self {
                summary: summary.into(),
                start,
                end,
                description: None,
                location: None,
                attendees: Vec::new(),
            }
        }

        pub fn description(mut self, description: impl Into<String>) -> Self {
            self.description = Some(description.into());
            self
        }

        pub fn location(mut self, location: impl Into<String>) -> Self {
            self.location = Some(location.into());
            self
        }

        pub fn attendee(mut self, email: impl Into<String>) -> Self {
            self.attendees.push(email.into());
            self
        }

        pub fn to_event(&self) -> Event {
            Event {
                summary: Some(self.summary.clone()),
                description: self.description.clone(),
                location: self.location.clone(),
                start: Some(EventDateTime::utc(self.start)),
                end: Some(EventDateTime::utc(self.end)),
                attendees: self.attendees.iter().map(Attendee::new).collect(),
                ..Default::default()
            }
        }
    }

    /// Partial event update; only set fields replace the stored ones
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct EventPatch {
        pub summary: Option<String>,
        pub description: Option<String>,
        pub location: Option<String>,
        pub start: Option<DateTime<Utc>>,
        pub end: Option<DateTime<Utc>>,
        pub attendees: Option<Vec<String>>,
    }

    impl EventPatch {
        pub fn is_empty(&self) -> bool {
            *self == Self::default()
        }

        /// Merge the set fields into `event`
        pub fn apply(&self, event: &mut Event) {
            if let Some(summary) = &self.summary {
                event.summary = Some(summary.clone());
            }
            if let Some(description) = &self.description {
                event.description = Some(description.clone());
            }
            if let Some(location) = &self.location {
                event.location = Some(location.clone());
            }
            if let Some(start) = self.start {
                event.start = Some(EventDateTime::utc(start));
            }
            if let Some(end) = self.end {
                event.end = Some(EventDateTime::utc(end));
            }
            if let Some(attendees) = &self.attendees {
                event.attendees = attendees.iter().map(Attendee::new).collect();
            }
        }
    }

    /// Time range and size of an event listing
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct EventWindow {
        /// Lower bound on event end time; now when unset
        pub time_min: Option<DateTime<Utc>>,
        /// Upper bound on event start time
        pub time_max: Option<DateTime<Utc>>,
        /// Defaults to 10
        pub max_results: Option<u32>,
    }

    impl EventWindow {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn since(mut self, time_min: DateTime<Utc>) -> Self {
            self.time_min = Some(time_min);
            self
        }

        pub fn until(mut self, time_max: DateTime<Utc>) -> Self {
            self.time_max = Some(time_max);
            self
        }

        pub fn max_results(mut self, max_results: u32) -> Self {
            self.max_results = Some(max_results);
            self
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::TimeZone;

        #[test]
        fn test_event_keeps_unknown_fields() {
            let raw = serde_json::json!({
                "id": "evt1",
                "summary": "Standup",
                "start": {"dateTime": "2024-03-01T09:00:00-05:00", "timeZone": "America/New_York"},
                "end": {"dateTime": "2024-03-01T09:15:00-05:00"},
                "recurrence": ["RRULE:FREQ=DAILY"],
                "reminders": {"useDefault": true}
            });
            let event: Event = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(event.extra.len(), 2);
            assert_eq!(serde_json::to_value(&event).unwrap(), raw);
        }

        #[test]
        fn test_all_day_event() {
            let raw = serde_json::json!({"start": {"date": "2024-07-04"}});
            let event: Event = serde_json::from_value(raw).unwrap();
            let start = event.start.unwrap();
            assert_eq!(start.date, NaiveDate::from_ymd_opt(2024, 7, 4));
            assert!(start.date_time.is_none());
        }

        #[test]
        fn test_patch_merges_only_set_fields() {
            let mut event = Event {
                summary: Some("Old".to_string()),
                location: Some("Room 1".to_string()),
                ..Default::default()
            };
            let new_start = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
            let patch = EventPatch {
                summary: Some("New".to_string()),
                start: Some(new_start),
                ..Default::default()
            };
            assert!(!patch.is_empty());
            patch.apply(&mut event);

            assert_eq!(event.summary.as_deref(), Some("New"));
            assert_eq!(event.location.as_deref(), Some("Room 1"));
            assert_eq!(event.start, Some(EventDateTime::utc(new_start)));
            assert!(event.end.is_none());
        }

        #[test]
        fn test_new_event_body() {
            let start = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
            let end = Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap();
            let event = NewEvent::new("Review", start, end)
                .location("HQ")
                .attendee("a@x.com")
                .to_event();

            assert_eq!(
                serde_json::to_value(&event).unwrap(),
                serde_json::json!({
                    "summary": "Review",
                    "location": "HQ",
                    "start": {"dateTime": "2024-05-01T14:00:00+00:00", "timeZone": "UTC"},
                    "end": {"dateTime": "2024-05-01T15:00:00+00:00", "timeZone": "UTC"},
                    "attendees": [{"email": "a@x.com"}]
                })
            );
        }
    }
}
