use gdal::spatial_ref::SpatialRef;
use log::{info, warn};

/// True if the CRS is projected with metre linear units. Window scales
/// are given in metres, so anything else makes them meaningless.
pub fn uses_metre_units(projection_wkt: &str) -> bool {
    let spatial_ref = match SpatialRef::from_wkt(projection_wkt) {
        Ok(sr) => sr,
        Err(e) => {
            warn!("Failed to parse projection WKT: {}", e);
            return false;
        }
    };

    if spatial_ref.is_geographic() {
        warn!("Geographic CRS detected (lat/lon), scales in metres will not match pixel units");
        return false;
    }

    if spatial_ref.is_projected() {
        let linear_units = spatial_ref.linear_units();

        if (linear_units - 1.0).abs() < 0.01 {
            info!("Projected CRS with metre units (units={:.6})", linear_units);
            return true;
        }
        warn!("Projected CRS with non-metre units (units={:.6})", linear_units);
        return false;
    }

    warn!("Unknown CRS type, cannot confirm metre units");
    false
}
