//! Shipment seeding and history commands.

use console::style;

use crate::config::Settings;
use crate::models::EventRef;
use crate::repository::{DeliveryRepository, EventLog, ShipmentStore};

use super::require_database;

pub async fn cmd_add(
    settings: &Settings,
    tracking_number: &str,
    weight: Option<f64>,
    packages: Option<i32>,
    cod: Option<f64>,
) -> anyhow::Result<()> {
    require_database(settings)?;

    let store = ShipmentStore::new(settings.pool());
    let shipment = store
        .create(&settings.default_tenant, tracking_number, weight, packages, cod)
        .await?;

    println!(
        "{} Registered shipment {} ({})",
        style("✓").green(),
        style(&shipment.tracking_number).bold(),
        shipment.id
    );
    Ok(())
}

pub async fn cmd_history(settings: &Settings, shipment_id: &str) -> anyhow::Result<()> {
    require_database(settings)?;

    let pool = settings.pool();
    let store = ShipmentStore::new(pool.clone());
    let deliveries = DeliveryRepository::new(pool.clone());
    let events = EventLog::new(pool);

    let shipment = store
        .get(shipment_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("shipment {shipment_id} not found"))?;

    println!(
        "{} [{}]",
        style(&shipment.tracking_number).bold(),
        shipment.status.as_str()
    );

    let attempts = deliveries.attempts_for(shipment_id).await?;
    if attempts.is_empty() {
        println!("  No delivery attempts");
    } else {
        for attempt in &attempts {
            let detail = attempt
                .failure_reason
                .as_deref()
                .unwrap_or("");
            println!(
                "  attempt {} at {}: {} {}",
                attempt.attempt_number,
                attempt.attempted_at.format("%Y-%m-%d %H:%M"),
                attempt.status.as_str(),
                detail
            );
        }
    }

    if let Some(pod) = deliveries.get_pod(shipment_id).await? {
        println!(
            "  POD: received by {} at {}",
            pod.recipient_name,
            pod.delivered_at.format("%Y-%m-%d %H:%M")
        );
    }

    let history = events
        .events_for(&EventRef::Shipment(shipment_id.to_string()))
        .await?;
    for event in &history {
        println!(
            "  event {} at {}",
            event.event_type,
            event.occurred_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
