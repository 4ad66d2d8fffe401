//! Google Calendar API client

use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use std::sync::Arc;

use super::api::{CalendarList, CalendarListEntry, Event, EventList, EventPatch, EventWindow, NewEvent};
use crate::auth::AuthManager;
use crate::error::Result;
use crate::session::{ApiSurface, BodyMethod, Session, SessionSlot};

const DEFAULT_MAX_EVENTS: u32 = 10;

/// Google Calendar client
pub struct CalendarClient {
    auth: Arc<AuthManager>,
    session: SessionSlot,
}

impl CalendarClient {
    pub fn new(auth: Arc<AuthManager>) -> Self {
        Self {
            auth,
            session: SessionSlot::new(ApiSurface::Calendar),
        }
    }

    /// Whether the Calendar session has been established
    pub fn is_ready(&self) -> bool {
        self.session.is_authenticated()
    }

    fn session(&self) -> Result<Session> {
        self.session.session(&self.auth)
    }

    /// Calendars on the user's calendar list
    pub fn list_calendars(&self) -> Result<Vec<CalendarListEntry>> {
        let session = self.session()?;
        let list: CalendarList =
            session.get_json("users/me/calendarList", &[], "Error listing calendars")?;
        debug!("Retrieved {} calendars", list.items.len());
        Ok(list.items)
    }

    /// Upcoming events, recurring events expanded, ordered by start time
    ///
    /// # Arguments
    /// * `calendar_id` - Calendar ID (`primary` for the user's main calendar)
    /// * `window` - Time range (defaults to starting now) and result count (default 10)
    pub fn list_events(&self, calendar_id: &str, window: &EventWindow) -> Result<Vec<Event>> {
        let session = self.session()?;

        let time_min = window.time_min.unwrap_or_else(Utc::now);
        let mut params = vec![
            ("timeMin", time_min.to_rfc3339_opts(SecondsFormat::Secs, true)),
            (
                "maxResults",
                window.max_results.unwrap_or(DEFAULT_MAX_EVENTS).to_string(),
            ),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(time_max) = window.time_max {
            params.push(("timeMax", time_max.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }

        let list: EventList =
            session.get_json(&events_path(calendar_id), &params, "Error listing events")?;
        debug!("Retrieved {} events", list.items.len());
        Ok(list.items)
    }

    pub fn get_event(&self, calendar_id: &str, event_id: &str) -> Result<Event> {
        let session = self.session()?;
        session.get_json(
            &event_path(calendar_id, event_id),
            &[],
            "Error getting event",
        )
    }

    pub fn create_event(&self, calendar_id: &str, event: &NewEvent) -> Result<Event> {
        let session = self.session()?;
        let created: Event = session.send_json(
            BodyMethod::Post,
            &events_path(calendar_id),
            &[],
            &event.to_event(),
            "Error creating event",
        )?;
        info!(
            "Event created: {} (ID: {})",
            created.summary.as_deref().unwrap_or(&event.summary),
            created.id.as_deref().unwrap_or("?")
        );
        Ok(created)
    }

    /// Fetch the event, merge the patch into it and write the whole event back
    pub fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<Event> {
        let mut event = self.get_event(calendar_id, event_id)?;
        patch.apply(&mut event);

        let session = self.session()?;
        let updated: Event = session.send_json(
            BodyMethod::Put,
            &event_path(calendar_id, event_id),
            &[],
            &event,
            "Error updating event",
        )?;
        info!(
            "Event updated: {}",
            updated.summary.as_deref().unwrap_or(event_id)
        );
        Ok(updated)
    }

    pub fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<()> {
        let session = self.session()?;
        session.delete(
            &event_path(calendar_id, event_id),
            &[],
            "Error deleting event",
        )?;
        info!("Event deleted: {}", event_id);
        Ok(())
    }
}

fn events_path(calendar_id: &str) -> String {
    format!("calendars/{}/events", urlencoding::encode(calendar_id))
}

fn event_path(calendar_id: &str, event_id: &str) -> String {
    format!(
        "{}/{}",
        events_path(calendar_id),
        urlencoding::encode(event_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_ids_are_encoded() {
        assert_eq!(events_path("primary"), "calendars/primary/events");
        assert_eq!(
            event_path("team@group.calendar.google.com", "evt1"),
            "calendars/team%40group.calendar.google.com/events/evt1"
        );
    }
}
