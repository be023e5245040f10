//! Broadcast channel for lifecycle events.
//!
//! Subscribers are the notification sink. Publishing never waits for them and
//! a lagging subscriber only loses its own backlog.

use tokio::sync::broadcast;
use woodcraft_types::LifecycleEvent;

#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event. Fails only when nobody is subscribed.
	pub fn publish(
		&self,
		event: LifecycleEvent,
	) -> Result<(), broadcast::error::SendError<LifecycleEvent>> {
		self.sender.send(event).map(|_| ())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use woodcraft_types::{OrderEvent, OrderKind};

	#[tokio::test]
	async fn test_subscribers_receive_events() {
		let bus = EventBus::new(8);
		let mut receiver = bus.subscribe();

		bus.publish(LifecycleEvent::Order(OrderEvent::Created {
			order_id: "o1".into(),
			kind: OrderKind::Service,
		}))
		.unwrap();

		match receiver.recv().await.unwrap() {
			LifecycleEvent::Order(OrderEvent::Created { order_id, .. }) => {
				assert_eq!(order_id, "o1")
			},
			other => panic!("unexpected event {:?}", other),
		}
	}

	#[test]
	fn test_publish_without_subscribers_is_an_error() {
		let bus = EventBus::new(8);
		assert!(bus
			.publish(LifecycleEvent::Order(OrderEvent::Created {
				order_id: "o1".into(),
				kind: OrderKind::Service,
			}))
			.is_err());
	}
}
