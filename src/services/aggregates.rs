//! Aggregate recalculation for manifest totals.
//!
//! The six derived fields on a manifest (shipment count, weight,
//! packages, COD amount, delivered/failed/pending counts) are only ever
//! written here, from a full recomputation over the currently linked
//! stop rows. Every mutation that can change membership or outcome
//! calls this inside its own transaction.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::models::{ShipmentSummary, StopStatus};
use crate::repository::shipment::summaries_in;
use crate::repository::AsyncSqliteConnection;
use crate::schema::{manifest_shipments, manifests};

/// The six derived manifest fields.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ManifestTotals {
    pub total_shipments: i32,
    pub total_weight_kg: f64,
    pub total_packages: i32,
    pub total_cod_amount: f64,
    pub delivered_count: i32,
    pub failed_count: i32,
    pub pending_count: i32,
}

impl ManifestTotals {
    /// Compute totals from stop statuses and their shipments' summary
    /// fields. Missing shipments and null fields count as zero.
    pub fn compute(
        stops: &[(String, StopStatus)],
        shipments: &HashMap<String, ShipmentSummary>,
    ) -> Self {
        let mut totals = ManifestTotals {
            total_shipments: stops.len() as i32,
            ..Default::default()
        };

        for (shipment_id, status) in stops {
            if status.counts_as_pending() {
                totals.pending_count += 1;
            } else if *status == StopStatus::Delivered {
                totals.delivered_count += 1;
            } else {
                totals.failed_count += 1;
            }

            if let Some(shipment) = shipments.get(shipment_id) {
                totals.total_weight_kg += shipment.weight_kg.unwrap_or(0.0);
                totals.total_packages += shipment.package_count.unwrap_or(0);
                totals.total_cod_amount += shipment.cod_amount.unwrap_or(0.0);
            }
        }

        totals
    }
}

/// Recompute a manifest's aggregates and write them back in one update.
///
/// Runs on a borrowed connection so callers can include it in the same
/// transaction as the mutation that triggered it.
pub async fn recalculate(
    conn: &mut AsyncSqliteConnection,
    manifest_id: &str,
) -> Result<ManifestTotals> {
    let rows: Vec<(String, String)> = manifest_shipments::table
        .filter(manifest_shipments::manifest_id.eq(manifest_id))
        .select((
            manifest_shipments::shipment_id,
            manifest_shipments::status,
        ))
        .load(conn)
        .await?;

    let stops: Vec<(String, StopStatus)> = rows
        .into_iter()
        .map(|(id, status)| {
            let status = StopStatus::from_str(&status).unwrap_or(StopStatus::Pending);
            (id, status)
        })
        .collect();

    let ids: Vec<String> = stops.iter().map(|(id, _)| id.clone()).collect();
    let shipments: HashMap<String, ShipmentSummary> = summaries_in(conn, &ids)
        .await?
        .into_iter()
        .map(|s| (s.id.clone(), s))
        .collect();

    let totals = ManifestTotals::compute(&stops, &shipments);

    let rows = diesel::update(manifests::table.find(manifest_id))
        .set((
            manifests::total_shipments.eq(totals.total_shipments),
            manifests::total_weight_kg.eq(totals.total_weight_kg),
            manifests::total_packages.eq(totals.total_packages),
            manifests::total_cod_amount.eq(totals.total_cod_amount),
            manifests::delivered_count.eq(totals.delivered_count),
            manifests::failed_count.eq(totals.failed_count),
            manifests::pending_count.eq(totals.pending_count),
            manifests::version.eq(manifests::version + 1),
            manifests::updated_at.eq(Utc::now().to_rfc3339()),
        ))
        .execute(conn)
        .await?;

    if rows == 0 {
        return Err(Error::not_found("manifest", manifest_id));
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShipmentStatus;

    fn shipment(id: &str, weight: Option<f64>, packages: Option<i32>, cod: Option<f64>) -> ShipmentSummary {
        ShipmentSummary {
            id: id.to_string(),
            tenant_id: "t1".to_string(),
            tracking_number: format!("TRK-{id}"),
            status: ShipmentStatus::Pending,
            weight_kg: weight,
            package_count: packages,
            cod_amount: cod,
            delivered_at: None,
        }
    }

    #[test]
    fn test_compute_totals() {
        let stops = vec![
            ("a".to_string(), StopStatus::Delivered),
            ("b".to_string(), StopStatus::Failed),
            ("c".to_string(), StopStatus::Pending),
            ("d".to_string(), StopStatus::Skipped),
        ];
        let shipments: HashMap<_, _> = [
            ("a".to_string(), shipment("a", Some(1.5), Some(2), Some(10.0))),
            ("b".to_string(), shipment("b", Some(2.5), None, None)),
            ("c".to_string(), shipment("c", None, Some(3), Some(5.5))),
            // "d" missing from the store entirely
        ]
        .into_iter()
        .collect();

        let totals = ManifestTotals::compute(&stops, &shipments);
        assert_eq!(totals.total_shipments, 4);
        assert_eq!(totals.delivered_count, 1);
        assert_eq!(totals.failed_count, 1);
        // pending + in_transit + skipped fold into pending
        assert_eq!(totals.pending_count, 2);
        assert_eq!(
            totals.delivered_count + totals.failed_count + totals.pending_count,
            totals.total_shipments
        );
        assert_eq!(totals.total_weight_kg, 4.0);
        assert_eq!(totals.total_packages, 5);
        assert_eq!(totals.total_cod_amount, 15.5);
    }

    #[test]
    fn test_compute_empty() {
        let totals = ManifestTotals::compute(&[], &HashMap::new());
        assert_eq!(totals, ManifestTotals::default());
    }
}
