//! Stop assignment commands.

use console::style;

use crate::config::Settings;
use crate::repository::AssignmentRepository;

use super::require_database;

pub async fn cmd_add(
    settings: &Settings,
    manifest_id: &str,
    shipment_ids: &[String],
) -> anyhow::Result<()> {
    require_database(settings)?;
    if shipment_ids.is_empty() {
        anyhow::bail!("no shipment IDs given");
    }

    let repo = AssignmentRepository::new(settings.pool());
    let stops = repo.add_shipments(manifest_id, shipment_ids).await?;

    for stop in &stops {
        println!(
            "  {} stop {} -> {}",
            style("✓").green(),
            stop.stop_sequence,
            stop.shipment_id
        );
    }
    println!("{} Assigned {} shipment(s)", style("✓").green(), stops.len());
    Ok(())
}

pub async fn cmd_remove(
    settings: &Settings,
    manifest_id: &str,
    shipment_ids: &[String],
) -> anyhow::Result<()> {
    require_database(settings)?;
    if shipment_ids.is_empty() {
        anyhow::bail!("no shipment IDs given");
    }

    let repo = AssignmentRepository::new(settings.pool());
    let removed = repo.remove_shipments(manifest_id, shipment_ids).await?;

    println!("{} Removed {} shipment(s)", style("✓").green(), removed);
    Ok(())
}

pub async fn cmd_reorder(
    settings: &Settings,
    manifest_id: &str,
    shipment_ids: &[String],
) -> anyhow::Result<()> {
    require_database(settings)?;

    let repo = AssignmentRepository::new(settings.pool());
    repo.reorder_shipments(manifest_id, shipment_ids).await?;

    println!(
        "{} Reordered {} stop(s)",
        style("✓").green(),
        shipment_ids.len()
    );
    Ok(())
}

pub async fn cmd_available(settings: &Settings) -> anyhow::Result<()> {
    require_database(settings)?;

    let repo = AssignmentRepository::new(settings.pool());
    let shipments = repo.available_shipments(&settings.default_tenant).await?;

    if shipments.is_empty() {
        println!("No shipments available for assignment");
        return Ok(());
    }

    println!("{:<38} {:<26} {}", "ID", "TRACKING", "STATUS");
    for s in &shipments {
        println!(
            "{:<38} {:<26} {}",
            s.id,
            s.tracking_number,
            s.status.as_str()
        );
    }
    println!("{} shipment(s) available", shipments.len());
    Ok(())
}
