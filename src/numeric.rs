// Small numeric and string helpers shared by the monitors

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

pub fn round_two_decimals(value: f64) -> f64 {
    round_to(value, 2)
}

/// Arithmetic mean; 0 for an empty slice.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `(used_percent, free_percent)`, both 0 when `total` is not positive.
pub fn usage_percentages(free: f64, total: f64) -> (f64, f64) {
    if total > 0.0 {
        let free_percent = (free / total) * 100.0;
        (100.0 - free_percent, free_percent)
    } else {
        (0.0, 0.0)
    }
}

/// Longest prefix shared by every string, folded left to right.
pub fn common_prefix<S: AsRef<str>>(values: &[S]) -> String {
    let mut iter = values.iter().map(AsRef::as_ref);
    let Some(first) = iter.next() else {
        return String::new();
    };
    iter.fold(first, shared_prefix).to_string()
}

fn shared_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let end = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map_or(0, |((i, c), _)| i + c.len_utf8());
    &a[..end]
}
