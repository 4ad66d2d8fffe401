//! Calendar client against a mock Calendar server

mod common;

use chrono::{TimeZone, Utc};
use common::Fixture;
use google::CalendarClient;
use google::calendar::api::{EventPatch, EventWindow, NewEvent, PRIMARY_CALENDAR};
use mockito::Matcher;
use serde_json::json;

#[test]
fn list_calendars() {
    let mut fx = Fixture::new();
    fx.write_valid_token();
    let _mock = fx
        .server
        .mock("GET", "/calendar/v3/users/me/calendarList")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"items": [
                {"id": "me@example.com", "summary": "Me", "primary": true, "timeZone": "Europe/Berlin"},
                {"id": "team@group.calendar.google.com", "summary": "Team"}
            ]}"#,
        )
        .create();

    let calendar = CalendarClient::new(fx.manager());
    let calendars = calendar.list_calendars().unwrap();

    assert_eq!(calendars.len(), 2);
    assert!(calendars[0].primary);
    assert!(!calendars[1].primary);
}

#[test]
fn list_events_expands_and_orders() {
    let mut fx = Fixture::new();
    fx.write_valid_token();
    let list = fx
        .server
        .mock("GET", "/calendar/v3/calendars/primary/events")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("timeMin".into(), "2024-05-01T00:00:00Z".into()),
            Matcher::UrlEncoded("timeMax".into(), "2024-05-08T00:00:00Z".into()),
            Matcher::UrlEncoded("maxResults".into(), "10".into()),
            Matcher::UrlEncoded("singleEvents".into(), "true".into()),
            Matcher::UrlEncoded("orderBy".into(), "startTime".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"items": [
                {"id": "e1", "summary": "Standup",
                 "start": {"dateTime": "2024-05-02T09:00:00+02:00"},
                 "end": {"dateTime": "2024-05-02T09:15:00+02:00"}},
                {"id": "e2", "summary": "Holiday", "start": {"date": "2024-05-05"}, "end": {"date": "2024-05-06"}}
            ]}"#,
        )
        .create();

    let calendar = CalendarClient::new(fx.manager());
    let window = EventWindow::new()
        .since(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        .until(Utc.with_ymd_and_hms(2024, 5, 8, 0, 0, 0).unwrap());
    let events = calendar.list_events(PRIMARY_CALENDAR, &window).unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].summary.as_deref(), Some("Standup"));
    assert!(events[1].start.as_ref().unwrap().date.is_some());
    list.assert();
}

#[test]
fn list_events_defaults_to_now() {
    let mut fx = Fixture::new();
    fx.write_valid_token();
    let list = fx
        .server
        .mock("GET", "/calendar/v3/calendars/primary/events")
        .match_query(Matcher::AllOf(vec![
            Matcher::Regex("timeMin=".to_string()),
            Matcher::UrlEncoded("maxResults".into(), "3".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"items": []}"#)
        .create();

    let calendar = CalendarClient::new(fx.manager());
    let events = calendar
        .list_events(PRIMARY_CALENDAR, &EventWindow::new().max_results(3))
        .unwrap();

    assert!(events.is_empty());
    list.assert();
}

#[test]
fn create_event_in_utc() {
    let mut fx = Fixture::new();
    fx.write_valid_token();
    let create = fx
        .server
        .mock("POST", "/calendar/v3/calendars/primary/events")
        .match_body(Matcher::Json(json!({
            "summary": "Review",
            "description": "Q2 numbers",
            "start": {"dateTime": "2024-05-01T14:00:00+00:00", "timeZone": "UTC"},
            "end": {"dateTime": "2024-05-01T15:00:00+00:00", "timeZone": "UTC"},
            "attendees": [{"email": "a@x.com"}, {"email": "b@x.com"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "evt1", "summary": "Review", "htmlLink": "https://calendar.google.com/event?eid=1"}"#)
        .create();

    let calendar = CalendarClient::new(fx.manager());
    let event = NewEvent::new(
        "Review",
        Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap(),
    )
    .description("Q2 numbers")
    .attendee("a@x.com")
    .attendee("b@x.com");
    let created = calendar.create_event(PRIMARY_CALENDAR, &event).unwrap();

    assert_eq!(created.id.as_deref(), Some("evt1"));
    create.assert();
}

#[test]
fn update_merges_into_fetched_event() {
    let mut fx = Fixture::new();
    fx.write_valid_token();
    let _mock = fx
        .server
        .mock("GET", "/calendar/v3/calendars/primary/events/evt1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "evt1",
                "summary": "Old title",
                "location": "Room 4",
                "start": {"dateTime": "2024-05-01T14:00:00Z"},
                "end": {"dateTime": "2024-05-01T15:00:00Z"},
                "reminders": {"useDefault": false, "overrides": [{"method": "popup", "minutes": 5}]}
            })
            .to_string(),
        )
        .create();
    let put = fx
        .server
        .mock("PUT", "/calendar/v3/calendars/primary/events/evt1")
        .match_body(Matcher::PartialJson(json!({
            "id": "evt1",
            "summary": "New title",
            "location": "Room 4",
            "reminders": {"useDefault": false}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "evt1", "summary": "New title", "location": "Room 4"}"#)
        .create();

    let calendar = CalendarClient::new(fx.manager());
    let patch = EventPatch {
        summary: Some("New title".to_string()),
        ..Default::default()
    };
    let updated = calendar.update_event(PRIMARY_CALENDAR, "evt1", &patch).unwrap();

    assert_eq!(updated.summary.as_deref(), Some("New title"));
    put.assert();
}

#[test]
fn delete_missing_event_is_not_found() {
    let mut fx = Fixture::new();
    fx.write_valid_token();
    let _mock = fx
        .server
        .mock("DELETE", "/calendar/v3/calendars/primary/events/evt1")
        .with_status(204)
        .expect(1)
        .create();
    let _mock = fx
        .server
        .mock("DELETE", "/calendar/v3/calendars/primary/events/evt1")
        .with_status(410)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"code": 410, "message": "Resource has been deleted"}}"#)
        .expect(1)
        .create();

    let calendar = CalendarClient::new(fx.manager());
    calendar.delete_event(PRIMARY_CALENDAR, "evt1").unwrap();
    let err = calendar.delete_event(PRIMARY_CALENDAR, "evt1").unwrap_err();

    // Calendar answers 410 Gone for already deleted events
    assert!(err.is_not_found());
    assert!(err.to_string().contains("Resource has been deleted"));
}
