use chrono::NaiveDate;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{BookingStatus, ScheduleStatus, ServicePointStatus};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is gone
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "Dropping domain event");
            counter!("bookings.events.dropped", 1);
        }
    }
}

/// Domain events published by the services after a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    PartnerCreated(Uuid),
    PartnerDeleted(Uuid),

    ServicePointCreated {
        service_point_id: Uuid,
        partner_id: Uuid,
    },
    ServicePointStatusChanged {
        service_point_id: Uuid,
        old_status: ServicePointStatus,
        new_status: ServicePointStatus,
    },
    ServicePointDeleted(Uuid),
    ServicePointRestored(Uuid),

    ScheduleGenerated {
        service_point_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        created: u64,
        skipped: u64,
    },
    SlotStatusChanged {
        schedule_id: Uuid,
        old_status: ScheduleStatus,
        new_status: ScheduleStatus,
    },

    BookingCreated {
        booking_id: Uuid,
        schedule_id: Uuid,
    },
    BookingStatusChanged {
        booking_id: Uuid,
        old_status: BookingStatus,
        new_status: BookingStatus,
    },
}

impl Event {
    /// Stable name used as a log field and metric label
    pub fn name(&self) -> &'static str {
        match self {
            Event::PartnerCreated(_) => "partner_created",
            Event::PartnerDeleted(_) => "partner_deleted",
            Event::ServicePointCreated { .. } => "service_point_created",
            Event::ServicePointStatusChanged { .. } => "service_point_status_changed",
            Event::ServicePointDeleted(_) => "service_point_deleted",
            Event::ServicePointRestored(_) => "service_point_restored",
            Event::ScheduleGenerated { .. } => "schedule_generated",
            Event::SlotStatusChanged { .. } => "slot_status_changed",
            Event::BookingCreated { .. } => "booking_created",
            Event::BookingStatusChanged { .. } => "booking_status_changed",
        }
    }
}

/// Drains the event channel, logging every event until all senders are dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("bookings.events.processed", 1, "event" => event.name());

        match &event {
            Event::ScheduleGenerated {
                service_point_id,
                start_date,
                end_date,
                created,
                skipped,
            } => {
                info!(
                    service_point_id = %service_point_id,
                    %start_date,
                    %end_date,
                    created,
                    skipped,
                    "Schedule generated"
                );
            }
            Event::BookingStatusChanged {
                booking_id,
                old_status,
                new_status,
            } => {
                info!(
                    booking_id = %booking_id,
                    %old_status,
                    %new_status,
                    slot_status = %new_status.slot_status(),
                    "Booking status changed"
                );
            }
            other => info!(event = other.name(), payload = ?other, "Received event"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sender_delivers_events_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        sender.send(Event::PartnerCreated(first)).await.unwrap();
        sender.send(Event::PartnerDeleted(second)).await.unwrap();

        assert_eq!(rx.recv().await, Some(Event::PartnerCreated(first)));
        assert_eq!(rx.recv().await, Some(Event::PartnerDeleted(second)));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(Event::ServicePointDeleted(Uuid::nil())).await.is_err());
        sender
            .send_or_log(Event::ServicePointDeleted(Uuid::nil()))
            .await;
    }

    #[tokio::test]
    async fn process_events_stops_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let handle = tokio::spawn(process_events(rx));

        sender
            .send(Event::BookingStatusChanged {
                booking_id: Uuid::new_v4(),
                old_status: BookingStatus::Pending,
                new_status: BookingStatus::Confirmed,
            })
            .await
            .unwrap();
        drop(sender);

        handle.await.unwrap();
    }

    #[test]
    fn event_names_are_snake_case() {
        let event = Event::SlotStatusChanged {
            schedule_id: Uuid::nil(),
            old_status: ScheduleStatus::Available,
            new_status: ScheduleStatus::Booked,
        };
        assert_eq!(event.name(), "slot_status_changed");
    }
}
