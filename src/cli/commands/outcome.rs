//! Delivery outcome commands.

use console::style;

use crate::config::Settings;
use crate::models::{FailureInput, PodInput};
use crate::services::OutcomeRecorder;

use super::{parse_date_arg, require_database};

pub async fn cmd_delivered(
    settings: &Settings,
    manifest_id: &str,
    shipment_id: &str,
    recipient: String,
    driver: Option<String>,
    notes: Option<String>,
) -> anyhow::Result<()> {
    require_database(settings)?;

    let pod = PodInput {
        recipient_name: recipient,
        driver_id: driver,
        notes,
        ..Default::default()
    };

    let recorder = OutcomeRecorder::new(settings.pool());
    let outcome = recorder.mark_delivered(manifest_id, shipment_id, pod).await?;

    println!(
        "{} Delivered {} (attempt {})",
        style("✓").green(),
        shipment_id,
        outcome.attempt_number
    );
    print_totals(&outcome.totals);
    Ok(())
}

pub async fn cmd_failed(
    settings: &Settings,
    manifest_id: &str,
    shipment_id: &str,
    reason: String,
    code: Option<String>,
    reschedule: Option<&str>,
    driver: Option<String>,
) -> anyhow::Result<()> {
    require_database(settings)?;

    let failure = FailureInput {
        failure_reason: reason,
        failure_code: code,
        reschedule_date: reschedule.map(parse_date_arg).transpose()?,
        driver_id: driver,
        ..Default::default()
    };

    let recorder = OutcomeRecorder::new(settings.pool());
    let outcome = recorder.mark_failed(manifest_id, shipment_id, failure).await?;

    println!(
        "{} Failed {} (attempt {})",
        style("!").yellow(),
        shipment_id,
        outcome.attempt_number
    );
    print_totals(&outcome.totals);
    Ok(())
}

pub async fn cmd_in_transit(
    settings: &Settings,
    manifest_id: &str,
    shipment_id: &str,
    driver: Option<&str>,
) -> anyhow::Result<()> {
    require_database(settings)?;

    let recorder = OutcomeRecorder::new(settings.pool());
    recorder.mark_in_transit(manifest_id, shipment_id, driver).await?;

    println!("{} {} out for delivery", style("→").cyan(), shipment_id);
    Ok(())
}

pub async fn cmd_skip(
    settings: &Settings,
    manifest_id: &str,
    shipment_id: &str,
    reason: Option<&str>,
    driver: Option<&str>,
) -> anyhow::Result<()> {
    require_database(settings)?;

    let recorder = OutcomeRecorder::new(settings.pool());
    recorder.mark_skipped(manifest_id, shipment_id, reason, driver).await?;

    println!("{} Skipped {}", style("-").yellow(), shipment_id);
    Ok(())
}

fn print_totals(totals: &crate::services::ManifestTotals) {
    println!(
        "  Manifest now: {} delivered / {} failed / {} pending of {}",
        totals.delivered_count, totals.failed_count, totals.pending_count, totals.total_shipments
    );
}
