//! JSON export of the services list.
//!
//! Used by the `e` key and by the non-interactive `--export` mode; both write
//! the same document.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::app::HealthCounts;
use crate::data::{ServiceHealth, TimeRange};

/// Build the export document for `services` fetched over `time_range`.
pub fn build_export(
    services: &[ServiceHealth],
    time_range: TimeRange,
    exported_at: DateTime<Utc>,
) -> Value {
    let counts = HealthCounts::from_services(services);

    let total_requests: u64 = services.iter().map(|s| s.request_count).sum();
    let total_errors: u64 = services.iter().map(|s| s.error_count).sum();

    let mut export = serde_json::Map::new();
    export.insert("time_range".to_string(), json!(time_range.as_str()));
    export.insert("exported_at".to_string(), json!(exported_at.to_rfc3339()));
    export.insert(
        "summary".to_string(),
        json!({
            "total_services": counts.total(),
            "healthy": counts.healthy,
            "warning": counts.warning,
            "critical": counts.critical,
            "overall": counts.overall().as_str(),
            "total_requests": total_requests,
            "total_errors": total_errors,
        }),
    );

    // Worst first, then by name
    let mut ordered: Vec<&ServiceHealth> = services.iter().collect();
    ordered.sort_by(|a, b| {
        b.health_status
            .cmp(&a.health_status)
            .then_with(|| a.service_name.cmp(&b.service_name))
    });
    export.insert("services".to_string(), json!(ordered));

    Value::Object(export)
}

/// Write the export document for `services` to `path` as pretty JSON.
pub fn write_export(path: &Path, services: &[ServiceHealth], time_range: TimeRange) -> Result<()> {
    let document = build_export(services, time_range, Utc::now());
    let json = serde_json::to_string_pretty(&document)?;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_services;
    use chrono::TimeZone;

    #[test]
    fn test_summary_counts_and_order() {
        let exported_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().unwrap();
        let doc = build_export(&sample_services(), TimeRange::TwentyFourHours, exported_at);

        assert_eq!(doc["time_range"], "24h");
        assert_eq!(doc["exported_at"], "2024-05-01T12:00:00+00:00");
        assert_eq!(doc["summary"]["total_services"], 4);
        assert_eq!(doc["summary"]["healthy"], 2);
        assert_eq!(doc["summary"]["critical"], 1);
        assert_eq!(doc["summary"]["overall"], "critical");
        assert_eq!(doc["services"][0]["service_name"], "payments");
        assert_eq!(doc["services"][0]["health_status"], "critical");
    }

    #[test]
    fn test_empty_list() {
        let doc = build_export(&[], TimeRange::OneHour, Utc::now());
        assert_eq!(doc["summary"]["total_services"], 0);
        assert_eq!(doc["summary"]["overall"], "healthy");
        assert_eq!(doc["services"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn test_write_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        write_export(&path, &sample_services(), TimeRange::OneHour).unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["services"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn test_write_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("services.json");
        assert!(write_export(&path, &sample_services(), TimeRange::OneHour).is_err());
    }
}
