use std::time::Duration;

/// Renders uptime in the coarsest of seconds, minutes or hours.
///
/// The value is divided by 60 while it exceeds 60, at most twice, and the unit
/// is pluralised unless the value is exactly 1.
pub fn format_uptime(uptime: Duration) -> String {
    let mut value = uptime.as_secs_f64();
    let mut unit = "second";

    if value > 60.0 {
        value /= 60.0;
        unit = "minute";
    }
    if value > 60.0 {
        value /= 60.0;
        unit = "hour";
    }

    let plural = if value == 1.0 { "" } else { "s" };
    format!("{value} {unit}{plural}")
}
