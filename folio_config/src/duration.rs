use std::ops::Deref;

use serde::Deserialize;

/// A duration written as whitespace separated parts like `"1m 30s"`.
///
/// Supported units are `ms`, `s`, `m`, `h` and `d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Duration(pub std::time::Duration);

impl From<Duration> for std::time::Duration {
    fn from(value: Duration) -> Self {
        value.0
    }
}

impl Deref for Duration {
    type Target = std::time::Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let invalid = || <D::Error as serde::de::Error>::custom("Invalid duration");
        let mut out = std::time::Duration::default();
        for part in s.split_whitespace() {
            let unit_start = part
                .find(|c: char| !c.is_ascii_digit())
                .filter(|&idx| idx > 0)
                .ok_or_else(invalid)?;
            let (value, unit) = part.split_at(unit_start);
            let value = value.parse::<u64>().map_err(|_| invalid())?;
            let part = match unit {
                "ms" => Some(std::time::Duration::from_millis(value)),
                "s" => Some(std::time::Duration::from_secs(value)),
                "m" => value.checked_mul(60).map(std::time::Duration::from_secs),
                "h" => value.checked_mul(3600).map(std::time::Duration::from_secs),
                "d" => value.checked_mul(24 * 3600).map(std::time::Duration::from_secs),
                _ => return Err(invalid()),
            };
            out = part
                .and_then(|part| out.checked_add(part))
                .ok_or_else(|| <D::Error as serde::de::Error>::custom("Duration is too long"))?;
        }
        Ok(Self(out))
    }
}
