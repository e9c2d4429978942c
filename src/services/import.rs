//! Bulk manifest import.
//!
//! Rows come from an operator-supplied JSON file. Each row creates a
//! manifest and optionally assigns shipments to it by tracking number.
//! Rows are independent: a bad row is reported and skipped, the rest
//! of the file still imports.

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{Manifest, ManifestType, NewManifestInput};
use crate::repository::{AssignmentRepository, AsyncSqlitePool, ManifestRepository, ShipmentStore};

/// One manifest to create, as parsed from the import file.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestImportRow {
    pub manifest_date: chrono::NaiveDate,
    #[serde(default)]
    pub manifest_type: Option<ManifestType>,
    #[serde(default)]
    pub branch_id: Option<String>,
    #[serde(default)]
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub route_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Tracking numbers of shipments to assign, in stop order.
    #[serde(default)]
    pub tracking_numbers: Vec<String>,
}

/// Outcome of an import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub created: Vec<Manifest>,
    /// (row index, error message) for rows that did not import.
    pub errors: Vec<(usize, String)>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct ManifestImporter {
    manifests: ManifestRepository,
    assignments: AssignmentRepository,
    shipments: ShipmentStore,
}

impl ManifestImporter {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self {
            manifests: ManifestRepository::new(pool.clone()),
            assignments: AssignmentRepository::new(pool.clone()),
            shipments: ShipmentStore::new(pool),
        }
    }

    /// Import manifests for a tenant. Rows fail independently; the
    /// report carries both the created manifests and the per-row errors.
    pub async fn import_manifests(
        &self,
        tenant_id: &str,
        rows: Vec<ManifestImportRow>,
    ) -> Result<ImportReport> {
        let mut report = ImportReport::default();

        for (index, row) in rows.into_iter().enumerate() {
            match self.import_row(tenant_id, row).await {
                Ok(manifest) => {
                    info!(
                        "imported manifest {} ({})",
                        manifest.manifest_number, manifest.id
                    );
                    report.created.push(manifest);
                }
                Err(err) => {
                    warn!("import row {} failed: {}", index, err);
                    report.errors.push((index, err.to_string()));
                }
            }
        }

        Ok(report)
    }

    async fn import_row(&self, tenant_id: &str, row: ManifestImportRow) -> Result<Manifest> {
        let input = NewManifestInput {
            manifest_date: Some(row.manifest_date),
            manifest_type: row.manifest_type,
            branch_id: row.branch_id,
            vehicle_id: row.vehicle_id,
            driver_id: row.driver_id,
            route_id: row.route_id,
            notes: row.notes,
            ..Default::default()
        };
        let manifest = self.manifests.create(tenant_id, input).await?;

        if !row.tracking_numbers.is_empty() {
            let mut shipment_ids = Vec::with_capacity(row.tracking_numbers.len());
            for tracking in &row.tracking_numbers {
                let shipment = self
                    .shipments
                    .find_by_tracking(tenant_id, tracking)
                    .await?
                    .ok_or_else(|| Error::not_found("shipment", tracking))?;
                shipment_ids.push(shipment.id);
            }
            self.assignments
                .add_shipments(&manifest.id, &shipment_ids)
                .await?;
        }

        // Re-read so the returned manifest carries the aggregates.
        self.manifests
            .get_manifest(&manifest.id)
            .await?
            .ok_or_else(|| Error::not_found("manifest", &manifest.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::migrations::run_migrations;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    async fn setup() -> (tempfile::TempDir, AsyncSqlitePool) {
        let dir = tempdir().unwrap();
        let db_url = dir.path().join("test.db").display().to_string();
        run_migrations(&db_url).await.unwrap();
        let pool = AsyncSqlitePool::new(&db_url);
        (dir, pool)
    }

    fn row(date: (i32, u32, u32), tracking: &[&str]) -> ManifestImportRow {
        ManifestImportRow {
            manifest_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            manifest_type: None,
            branch_id: None,
            vehicle_id: Some("veh-1".to_string()),
            driver_id: Some("drv-1".to_string()),
            route_id: None,
            notes: None,
            tracking_numbers: tracking.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_import_continues_past_bad_rows() {
        let (_dir, pool) = setup().await;
        let shipments = ShipmentStore::new(pool.clone());
        shipments
            .create("t1", "TRK-1", Some(1.5), Some(1), None)
            .await
            .unwrap();

        let importer = ManifestImporter::new(pool);
        let rows = vec![
            row((2025, 6, 20), &["TRK-1"]),
            row((2025, 6, 21), &["TRK-MISSING"]),
            row((2025, 6, 22), &[]),
        ];

        let report = importer.import_manifests("t1", rows).await.unwrap();
        assert_eq!(report.created.len(), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, 1);
        assert!(!report.is_clean());

        // The good row got its shipment assigned and counted.
        assert_eq!(report.created[0].total_shipments, 1);
        assert_eq!(report.created[1].total_shipments, 0);
    }

    #[tokio::test]
    async fn test_import_rows_parse_with_defaults() {
        let json = r#"[{"manifest_date": "2025-06-20"}]"#;
        let rows: Vec<ManifestImportRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].tracking_numbers.is_empty());
        assert!(rows[0].driver_id.is_none());
    }
}
