use std::time::Duration;

use crate::error::ConfigError;

/// Parses `"250ms"`, `"30s"`, `"5m"` or `"2h"`; a bare number is seconds.
pub(crate) fn parse_duration_value(value: &str) -> Result<Duration, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::DurationEmpty);
    }

    let digits_len = value.chars().take_while(char::is_ascii_digit).count();
    if digits_len == 0 {
        return Err(ConfigError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part
        .parse()
        .map_err(|err| ConfigError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })?;

    let overflow = || ConfigError::InvalidDurationFormat {
        value: value.to_owned(),
    };
    let unit = if unit_part.is_empty() { "s" } else { unit_part };
    let duration = match unit {
        "ms" => Duration::from_millis(number),
        "s" => Duration::from_secs(number),
        "m" => Duration::from_secs(number.checked_mul(60).ok_or_else(overflow)?),
        "h" => Duration::from_secs(number.checked_mul(3_600).ok_or_else(overflow)?),
        other => {
            return Err(ConfigError::InvalidDurationUnit {
                unit: other.to_owned(),
            });
        }
    };

    if duration.as_millis() == 0 {
        return Err(ConfigError::DurationZero);
    }

    Ok(duration)
}
