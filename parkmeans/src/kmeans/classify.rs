/// Index of the centroid nearest to `observation`.
///
/// Scans in index order with a strict less-than comparison, so an
/// observation equidistant from two centroids goes to the lower index.
/// Returns 0 when `centroids` is empty or every distance is NaN.
pub fn nearest_centroid(observation: u8, centroids: &[f32]) -> usize {
    let x = f32::from(observation);
    let mut nearest = 0;
    let mut best = f32::INFINITY;
    for (i, &c) in centroids.iter().enumerate() {
        let distance = (x - c).abs();
        if distance < best {
            best = distance;
            nearest = i;
        }
    }
    nearest
}
