use crate::models::Reading;

/// Median of the available readings in a window
///
/// Unavailable entries are dropped before ordering. An odd count yields the
/// middle value, an even count the mean of the two central values, and an
/// empty remainder yields `Reading::Unavailable`.
pub fn median(window: &[Reading]) -> Reading {
    let mut values: Vec<f64> = window.iter().filter_map(|r| r.value()).collect();
    if values.is_empty() {
        return Reading::Unavailable;
    }

    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Reading::Available(values[mid])
    } else {
        Reading::Available((values[mid - 1] + values[mid]) / 2.0)
    }
}
