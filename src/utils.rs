/// Join items into a comma separated list, used in error messages.
pub fn items_to_strings(items: Vec<&str>) -> String {
    let mut s = String::new();
    for i in items {
        s.push_str(i);
        s.push_str(&String::from(", "));
    }
    s
}

/// Index of the largest value, the lowest index wins ties.
/// Returns `None` for an empty slice.
pub fn argmax(v: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, x) in v.iter().enumerate() {
        if x.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if *x <= b => {}
            _ => best = Some((i, *x)),
        }
    }
    best.map(|(i, _)| i)
}

/// Scale values so they sum to one. If the values sum to zero
/// (or less), `None` is returned.
pub fn normalize(v: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = v.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    Some(v.iter().map(|x| x / total).collect())
}

/// Render a float without a trailing `.0` when it is integral,
/// the way PMML attribute values are usually written.
pub fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
