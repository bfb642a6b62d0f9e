use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info};
use transfer_core::{BookingEventPublisher, CoreError};
use transfer_shared::models::events::{BookingConfirmedEvent, CapacityExhaustedEvent};

use crate::app_config::KafkaConfig;

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!(
                    "Sent message to {}/{}: partition {} offset {}",
                    topic, key, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }
}

/// Publishes booking events as JSON, keyed so all events of one slot land
/// on the same partition.
pub struct KafkaEventPublisher {
    producer: EventProducer,
    confirmed_topic: String,
    capacity_topic: String,
}

impl KafkaEventPublisher {
    pub fn new(config: &KafkaConfig) -> Result<Self, rdkafka::error::KafkaError> {
        Ok(Self {
            producer: EventProducer::new(&config.brokers)?,
            confirmed_topic: config.confirmed_topic.clone(),
            capacity_topic: config.capacity_topic.clone(),
        })
    }

    async fn send<T: serde::Serialize>(&self, topic: &str, key: &str, event: &T) -> Result<(), CoreError> {
        let payload = serde_json::to_string(event).map_err(|e| CoreError::InternalError(e.to_string()))?;
        self.producer
            .publish(topic, key, &payload)
            .await
            .map_err(|e| CoreError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl BookingEventPublisher for KafkaEventPublisher {
    async fn publish_confirmed(&self, event: &BookingConfirmedEvent) -> Result<(), CoreError> {
        let key = format!("{}:{:02}:{}", event.pickup_date, event.pickup_hour, event.vehicle_class);
        self.send(&self.confirmed_topic, &key, event).await
    }

    async fn publish_capacity_exhausted(&self, event: &CapacityExhaustedEvent) -> Result<(), CoreError> {
        let key = format!("{}:{:02}:{}", event.date, event.hour, event.vehicle_class);
        self.send(&self.capacity_topic, &key, event).await
    }
}
