use ndarray::Array2;

/// No-data value of the land cover map; every such pixel is sea.
pub const SEA_NODATA: i32 = 0;

/// True if the clip holds any no-data pixel. Such cells are excluded
/// from the analysis to avoid coastal edge effects.
pub fn is_coastal(data: &Array2<i32>, nodata: i32) -> bool {
    data.iter().any(|&value| value == nodata)
}
