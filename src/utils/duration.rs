// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Serde helpers for durations stored as seconds

/// `Duration` as a floating point number of seconds
pub mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// `Option<Duration>` as seconds, absent when `None`
pub mod opt_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<f64>::deserialize(deserializer)? {
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Timeouts {
        #[serde(with = "super::secs")]
        render: Duration,
        #[serde(default, with = "super::opt_secs", skip_serializing_if = "Option::is_none")]
        idle: Option<Duration>,
    }

    #[test]
    fn test_json_seconds() {
        let t = Timeouts {
            render: Duration::from_millis(1500),
            idle: None,
        };
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"render":1.5}"#);
        assert_eq!(serde_json::from_str::<Timeouts>(&json).unwrap(), t);
    }

    #[test]
    fn test_negative_rejected() {
        assert!(serde_json::from_str::<Timeouts>(r#"{"render":-1.0}"#).is_err());
        let t: Timeouts = serde_json::from_str(r#"{"render":2,"idle":60}"#).unwrap();
        assert_eq!(t.idle, Some(Duration::from_secs(60)));
    }
}
