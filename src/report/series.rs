use crate::format::period::PeriodMode;

/// All key/value pairs of `properties`, sorted by key.
pub fn sorted_properties<K: Ord, V>(properties: impl IntoIterator<Item = (K, V)>) -> Vec<(K, V)> {
    let mut items: Vec<(K, V)> = properties.into_iter().collect();
    items.sort_by(|a, b| a.0.cmp(&b.0));
    items
}

/// Day (month mode) or month (year mode) number encoded by `key`, if the key
/// is one data point of `period`.
fn position_in_period(key: &str, period: &str, mode: PeriodMode) -> Option<usize> {
    if key.len() != mode.key_len() || period.len() != mode.prefix_len() {
        return None;
    }
    let (prefix, suffix) = key.split_at_checked(mode.prefix_len())?;
    if prefix != period {
        return None;
    }
    if !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=mode.max_position()).contains(n))
}

/// Turn date-keyed records into a dense chart series for `period`.
///
/// `sorted` must be ordered by key. Only keys of the mode's length whose
/// prefix is `period` are used; each gets the next index. Leading days (or
/// months) before the first known one are filled with `V::default()`, so
/// that index 0 is always the first day of the month (or January). A period
/// without any matching key yields an empty series.
pub fn build_series<V: Clone + Default>(
    sorted: &[(String, V)],
    period: &str,
    mode: PeriodMode,
) -> Vec<(usize, V)> {
    let mut matching = sorted
        .iter()
        .filter_map(|(key, value)| position_in_period(key, period, mode).map(|_| (key, value)))
        .peekable();

    let Some(first) = matching
        .peek()
        .and_then(|(key, _)| position_in_period(key, period, mode))
    else {
        return Vec::new();
    };

    let mut series: Vec<(usize, V)> = (0..first - 1).map(|x| (x, V::default())).collect();
    let offset = series.len();
    series.extend(
        matching
            .enumerate()
            .map(|(i, (_, value))| (offset + i, value.clone())),
    );
    series
}
