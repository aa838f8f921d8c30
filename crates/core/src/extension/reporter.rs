/// Text a reporter block shows for a coordinate. No data shows as empty.
pub fn reporter_text(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v == 0.0 => "0".to_string(),
        Some(v) => v.to_string(),
    }
}
