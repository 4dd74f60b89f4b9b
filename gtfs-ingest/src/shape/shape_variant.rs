use serde::{Deserialize, Serialize};

use crate::ingest_error::IngestError;
use crate::reader::TripGroup;

/// one deduplicated polyline variant of a route's path. raw shapes sharing
/// a fingerprint are the same path; only the first-seen geometry is kept
/// and later ids are unioned in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeVariant {
    #[serde(rename = "fullGTFSIDs")]
    pub full_gtfs_ids: Vec<String>,
    pub hash: String,
    pub length: f64,
    /// lon,lat coordinate pairs in path order
    pub path: Vec<[f64; 2]>,
}

/// one raw shape from the feed: an ordered point list with cumulative
/// distances.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedShape {
    pub shape_id: String,
    pub path: Vec<[f64; 2]>,
    pub length: f64,
}

impl FeedShape {
    /// assembles a shape from its grouped shapes.txt rows, restoring point
    /// order from the sequence column.
    pub fn from_group(group: &TripGroup) -> Result<FeedShape, IngestError> {
        let mut points: Vec<(u32, [f64; 2], f64)> = Vec::with_capacity(group.rows.len());
        for row in &group.rows {
            let sequence: u32 = row.get("shape_pt_sequence")?.parse().map_err(|_| {
                IngestError::InvalidDataError(format!(
                    "shape '{}' has a malformed point sequence",
                    group.group_id
                ))
            })?;
            let latitude: f64 = row.get("shape_pt_lat")?.parse().map_err(|_| {
                IngestError::InvalidDataError(format!(
                    "shape '{}' has a malformed latitude",
                    group.group_id
                ))
            })?;
            let longitude: f64 = row.get("shape_pt_lon")?.parse().map_err(|_| {
                IngestError::InvalidDataError(format!(
                    "shape '{}' has a malformed longitude",
                    group.group_id
                ))
            })?;
            let distance: f64 = row
                .get_opt("shape_dist_traveled")
                .and_then(|value| value.parse().ok())
                .unwrap_or(0.0);
            points.push((sequence, [longitude, latitude], distance));
        }
        points.sort_by_key(|(sequence, _, _)| *sequence);

        let length = points.last().map(|(_, _, distance)| *distance).unwrap_or(0.0);
        Ok(FeedShape {
            shape_id: group.group_id.clone(),
            path: points.into_iter().map(|(_, point, _)| point).collect(),
            length,
        })
    }

    /// the content fingerprint `(length, first point, last point)`.
    /// coordinates are quantized to 1e-6 degrees so near-identical exports
    /// of the same path collide.
    pub fn fingerprint(&self) -> String {
        let quantize = |point: &[f64; 2]| {
            (
                (point[0] * 1e6).round() as i64,
                (point[1] * 1e6).round() as i64,
            )
        };
        match (self.path.first(), self.path.last()) {
            (Some(first), Some(last)) => {
                let (first_lon, first_lat) = quantize(first);
                let (last_lon, last_lat) = quantize(last);
                format!(
                    "{:.1}:{first_lon},{first_lat}:{last_lon},{last_lat}",
                    self.length
                )
            }
            _ => format!("{:.1}:empty", self.length),
        }
    }

    pub fn into_variant(self) -> ShapeVariant {
        let hash = self.fingerprint();
        ShapeVariant {
            full_gtfs_ids: vec![self.shape_id],
            hash,
            length: self.length,
            path: self.path,
        }
    }
}
