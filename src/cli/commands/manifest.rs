//! Manifest lifecycle commands.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::models::{Manifest, ManifestFilter, NewManifestInput};
use crate::repository::ManifestRepository;
use crate::services::{ManifestImportRow, ManifestImporter};

use super::{parse_date_arg, parse_status, require_database};

pub async fn cmd_create(
    settings: &Settings,
    date: &str,
    vehicle: Option<String>,
    driver: Option<String>,
    route: Option<String>,
    notes: Option<String>,
) -> anyhow::Result<()> {
    require_database(settings)?;

    let input = NewManifestInput {
        manifest_date: Some(parse_date_arg(date)?),
        vehicle_id: vehicle,
        driver_id: driver,
        route_id: route,
        notes,
        ..Default::default()
    };

    let repo = ManifestRepository::new(settings.pool());
    let manifest = repo.create(&settings.default_tenant, input).await?;

    println!(
        "{} Created manifest {} ({})",
        style("✓").green(),
        style(&manifest.manifest_number).bold(),
        manifest.id
    );
    Ok(())
}

pub async fn cmd_ls(
    settings: &Settings,
    status: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    number: Option<String>,
) -> anyhow::Result<()> {
    require_database(settings)?;

    let filter = ManifestFilter {
        status: status.map(parse_status).transpose()?,
        date_from: from.map(parse_date_arg).transpose()?,
        date_to: to.map(parse_date_arg).transpose()?,
        number_like: number,
        ..Default::default()
    };

    let repo = ManifestRepository::new(settings.pool());
    let manifests = repo.list(&settings.default_tenant, &filter).await?;

    if manifests.is_empty() {
        println!("No manifests found");
        return Ok(());
    }

    println!(
        "{:<18} {:<12} {:<12} {:>6} {:>6} {:>6}",
        "NUMBER", "DATE", "STATUS", "STOPS", "DLVD", "FAIL"
    );
    for m in &manifests {
        println!(
            "{:<18} {:<12} {:<12} {:>6} {:>6} {:>6}",
            m.manifest_number,
            m.manifest_date,
            m.status.as_str(),
            m.total_shipments,
            m.delivered_count,
            m.failed_count
        );
    }
    println!("{} manifest(s)", manifests.len());
    Ok(())
}

pub async fn cmd_info(settings: &Settings, manifest_id: &str) -> anyhow::Result<()> {
    require_database(settings)?;

    let repo = ManifestRepository::new(settings.pool());
    let detail = repo
        .get(manifest_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("manifest {manifest_id} not found"))?;

    print_manifest(&detail.manifest);

    if detail.stops.is_empty() {
        println!("  (no stops assigned)");
        return Ok(());
    }

    println!();
    println!("  {:<4} {:<26} {:<12} {}", "SEQ", "TRACKING", "STATUS", "NOTES");
    for stop in &detail.stops {
        let tracking = stop
            .shipment
            .as_ref()
            .map(|s| s.tracking_number.as_str())
            .unwrap_or("<missing>");
        println!(
            "  {:<4} {:<26} {:<12} {}",
            stop.stop.stop_sequence,
            tracking,
            stop.stop.status.as_str(),
            stop.stop.driver_notes.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub async fn cmd_status(
    settings: &Settings,
    manifest_id: &str,
    status: &str,
) -> anyhow::Result<()> {
    require_database(settings)?;

    let new_status = parse_status(status)?;
    let repo = ManifestRepository::new(settings.pool());
    let manifest = repo.change_status(manifest_id, new_status).await?;

    println!(
        "{} {} is now {}",
        style("✓").green(),
        manifest.manifest_number,
        style(manifest.status.as_str()).bold()
    );
    Ok(())
}

pub async fn cmd_duplicate(settings: &Settings, manifest_id: &str) -> anyhow::Result<()> {
    require_database(settings)?;

    let repo = ManifestRepository::new(settings.pool());
    let copy = repo.duplicate(manifest_id).await?;

    println!(
        "{} Duplicated as {} ({})",
        style("✓").green(),
        style(&copy.manifest_number).bold(),
        copy.id
    );
    Ok(())
}

pub async fn cmd_delete(settings: &Settings, manifest_id: &str) -> anyhow::Result<()> {
    require_database(settings)?;

    let repo = ManifestRepository::new(settings.pool());
    repo.delete(manifest_id).await?;

    println!("{} Deleted manifest {}", style("✓").green(), manifest_id);
    Ok(())
}

pub async fn cmd_import(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    require_database(settings)?;

    let content = std::fs::read_to_string(file)?;
    let rows: Vec<ManifestImportRow> = serde_json::from_str(&content)?;
    let total = rows.len();

    let importer = ManifestImporter::new(settings.pool());
    let report = importer
        .import_manifests(&settings.default_tenant, rows)
        .await?;

    for manifest in &report.created {
        println!(
            "  {} {} ({} stop(s))",
            style("✓").green(),
            manifest.manifest_number,
            manifest.total_shipments
        );
    }
    for (index, error) in &report.errors {
        println!("  {} row {}: {}", style("✗").red(), index, error);
    }

    println!(
        "{} Imported {}/{} manifest(s)",
        if report.is_clean() {
            style("✓").green()
        } else {
            style("!").yellow()
        },
        report.created.len(),
        total
    );
    Ok(())
}

fn print_manifest(m: &Manifest) {
    println!(
        "{} {} [{}]",
        style(&m.manifest_number).bold(),
        m.manifest_date,
        style(m.status.as_str()).cyan()
    );
    println!("  ID:      {}", m.id);
    if let Some(ref vehicle) = m.vehicle_id {
        println!("  Vehicle: {vehicle}");
    }
    if let Some(ref driver) = m.driver_id {
        println!("  Driver:  {driver}");
    }
    if let Some(ref route) = m.route_id {
        println!("  Route:   {route}");
    }
    println!(
        "  Stops:   {} total / {} delivered / {} failed / {} pending",
        m.total_shipments, m.delivered_count, m.failed_count, m.pending_count
    );
    println!(
        "  Load:    {:.1} kg, {} package(s), {:.2} COD",
        m.total_weight_kg, m.total_packages, m.total_cod_amount
    );
}
