//! In-process event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use vehiclehub_domain::event::Event;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped). Slow subscribers lag and skip events
/// rather than slowing down writers.
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Publish an event to every current subscriber.
    pub fn publish(&self, event: Event) {
        // fails only when there are zero receivers
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vehiclehub_domain::entry::Entry;
    use vehiclehub_domain::event::EventType;
    use vehiclehub_domain::key::Key;
    use vehiclehub_domain::time::{now, utc};
    use vehiclehub_domain::value::Value;

    fn event(key: &str) -> Event {
        let entry = Entry::new(Key::parse(key).unwrap(), Value::Bool(true), now(utc()), false);
        Event::from_entry(EventType::SessionChanged, key.to_string(), &entry)
    }

    #[tokio::test]
    async fn should_deliver_event_to_multiple_subscribers() {
        let bus = InProcessEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let event = event("ACC_POWER");
        let event_id = event.id;
        bus.publish(event);

        assert_eq!(rx1.recv().await.unwrap().id, event_id);
        assert_eq!(rx2.recv().await.unwrap().id, event_id);
    }

    #[tokio::test]
    async fn should_not_deliver_events_published_before_subscription() {
        let bus = InProcessEventBus::new(16);
        bus.publish(event("ACC_POWER"));

        let mut rx = bus.subscribe();
        let later = event("KEY_STATE");
        let later_id = later.id;
        bus.publish(later);

        assert_eq!(rx.recv().await.unwrap().id, later_id);
    }
}
