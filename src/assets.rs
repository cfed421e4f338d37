// src/assets.rs
//
// Icon asset pipeline: download every record's icon to disk with a SHA-256
// checksum, then validate the collection (missing files, corrupt images,
// checksum duplicates).

use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::core::net::WikiClient;
use crate::model::{AssetRecord, HasIcon};

#[derive(Debug, Error)]
#[error("Asset validation failed with {missing} missing and {corrupt} corrupt assets")]
pub struct AssetValidationError {
    pub missing: usize,
    pub corrupt: usize,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub missing: Vec<String>,
    pub corrupt: Vec<String>,
    pub duplicates: BTreeMap<String, Vec<String>>,
    pub asset_count: usize,
    pub record_count: usize,
}

/// Download each entity's icon into `output_dir` as `<id>.<ext>`.
pub fn download_assets(
    client: &WikiClient,
    records: &[&dyn HasIcon],
    output_dir: &Path,
) -> Result<Vec<AssetRecord>, Box<dyn Error>> {
    fs::create_dir_all(output_dir)?;
    let mut assets = Vec::with_capacity(records.len());

    for record in records {
        let source_url = record.icon_url();
        let ext = guess_extension(source_url);
        let local_path = output_dir.join(format!("{}.{ext}", record.id()));

        let content = client.fetch_bytes(source_url)?;
        fs::write(&local_path, &content)?;
        logd!("assets: {} -> {}", source_url, local_path.display());

        let checksum = format!("{:x}", Sha256::digest(&content));
        assets.push(AssetRecord {
            id: s!(record.id()),
            source_url: s!(source_url),
            local_path: local_path.to_string_lossy().into_owned(),
            checksum_sha256: Some(checksum),
        });
    }

    Ok(assets)
}

/// Cross-check records against downloaded assets and write a JSON report.
/// Missing or corrupt assets fail the run; duplicate checksums are only
/// reported (ring families legitimately share one icon).
pub fn validate_assets(
    records: &[&dyn HasIcon],
    assets: &[AssetRecord],
    report_path: &Path,
) -> Result<ValidationReport, Box<dyn Error>> {
    let by_id: BTreeMap<&str, &AssetRecord> =
        assets.iter().map(|a| (a.id.as_str(), a)).collect();

    let mut missing = Vec::new();
    let mut corrupt = Vec::new();

    for record in records {
        let Some(asset) = by_id.get(record.id()) else {
            missing.push(s!(record.id()));
            continue;
        };
        let path = Path::new(&asset.local_path);
        match fs::read(path) {
            Err(_) => missing.push(s!(record.id())),
            Ok(content) => {
                if sniff_image_type(&content).is_none() {
                    corrupt.push(s!(record.id()));
                }
            }
        }
    }
    missing.sort();
    corrupt.sort();

    let mut reverse: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for asset in assets {
        if let Some(checksum) = &asset.checksum_sha256 {
            reverse.entry(checksum.clone()).or_default().push(asset.id.clone());
        }
    }
    let duplicates: BTreeMap<String, Vec<String>> =
        reverse.into_iter().filter(|(_, ids)| ids.len() > 1).collect();

    let report = ValidationReport {
        missing,
        corrupt,
        duplicates,
        asset_count: assets.len(),
        record_count: records.len(),
    };

    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(report_path, serde_json::to_string_pretty(&report)?)?;

    if !report.missing.is_empty() || !report.corrupt.is_empty() {
        return Err(AssetValidationError {
            missing: report.missing.len(),
            corrupt: report.corrupt.len(),
        }
        .into());
    }
    Ok(report)
}

/// Magic-byte sniff for the formats the wiki serves.
fn sniff_image_type(content: &[u8]) -> Option<&'static str> {
    if content.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("png");
    }
    if content.starts_with(b"\xff\xd8\xff") {
        return Some("jpeg");
    }
    if content.starts_with(b"GIF87a") || content.starts_with(b"GIF89a") {
        return Some("gif");
    }
    if content.len() >= 12 && &content[..4] == b"RIFF" && &content[8..12] == b"WEBP" {
        return Some("webp");
    }
    None
}

fn guess_extension(url: &str) -> &'static str {
    let lowered = url.to_ascii_lowercase();
    let path = lowered.split('?').next().unwrap_or("");
    for ext in ["png", "jpg", "jpeg", "gif", "webp"] {
        if path.ends_with(&format!(".{ext}")) {
            return if ext == "jpeg" { "jpg" } else { ext };
        }
    }
    "png"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::model::ItemRecord;

    fn tmp_dir(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("realm_assets_{}", name));
        let _ = fs::remove_dir_all(&p);
        fs::create_dir_all(&p).unwrap();
        p
    }

    fn item(id: &str) -> ItemRecord {
        ItemRecord {
            id: s!(id),
            name: s!("Some Item"),
            icon_url: format!("https://www.realmeye.com/{id}.png"),
            page_url: s!("https://www.realmeye.com/wiki/some-item"),
            item_type: None,
            tier: None,
        }
    }

    fn asset(id: &str, local_path: &Path, checksum: &str) -> AssetRecord {
        AssetRecord {
            id: s!(id),
            source_url: format!("https://www.realmeye.com/{id}.png"),
            local_path: local_path.to_string_lossy().into_owned(),
            checksum_sha256: Some(s!(checksum)),
        }
    }

    #[test]
    fn validation_reports_missing_and_corrupt_then_fails() {
        let dir = tmp_dir("missing_corrupt");
        let good_path = dir.join("item-good.png");
        fs::write(&good_path, b"\x89PNG\r\n\x1a\n0000").unwrap();
        let bad_path = dir.join("item-bad.png");
        fs::write(&bad_path, b"not-an-image").unwrap();

        let records = [item("item-good"), item("item-bad"), item("item-gone")];
        let refs: Vec<&dyn HasIcon> = records.iter().map(|r| r as &dyn HasIcon).collect();
        let assets = vec![
            asset("item-good", &good_path, "aaa"),
            asset("item-bad", &bad_path, "bbb"),
        ];

        let report_path = dir.join("asset-validation.json");
        let err = validate_assets(&refs, &assets, &report_path).unwrap_err();
        assert!(err.to_string().contains("1 missing and 1 corrupt"));

        // The report is written even when validation fails.
        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(report["missing"], serde_json::json!(["item-gone"]));
        assert_eq!(report["corrupt"], serde_json::json!(["item-bad"]));
        assert_eq!(report["asset_count"], 2);
        assert_eq!(report["record_count"], 3);
    }

    #[test]
    fn validation_passes_and_reports_checksum_duplicates() {
        let dir = tmp_dir("duplicates");
        let a_path = dir.join("item-a.png");
        let b_path = dir.join("item-b.png");
        fs::write(&a_path, b"\x89PNG\r\n\x1a\n0000").unwrap();
        fs::write(&b_path, b"\x89PNG\r\n\x1a\n0000").unwrap();

        let records = [item("item-a"), item("item-b")];
        let refs: Vec<&dyn HasIcon> = records.iter().map(|r| r as &dyn HasIcon).collect();
        let assets = vec![
            asset("item-a", &a_path, "samehash"),
            asset("item-b", &b_path, "samehash"),
        ];

        let report_path = dir.join("asset-validation.json");
        let report = validate_assets(&refs, &assets, &report_path).unwrap();
        assert!(report.missing.is_empty());
        assert!(report.corrupt.is_empty());
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates["samehash"], vec!["item-a", "item-b"]);
    }

    #[test]
    fn sniff_known_signatures() {
        assert_eq!(sniff_image_type(b"\x89PNG\r\n\x1a\nxxxx"), Some("png"));
        assert_eq!(sniff_image_type(b"\xff\xd8\xff\xe0xxxx"), Some("jpeg"));
        assert_eq!(sniff_image_type(b"GIF89axxxx"), Some("gif"));
        assert_eq!(sniff_image_type(b"RIFFxxxxWEBPxxxx"), Some("webp"));
    }

    #[test]
    fn sniff_unknown_signature() {
        assert_eq!(sniff_image_type(b"not-an-image"), None);
        assert_eq!(sniff_image_type(b""), None);
    }

    #[test]
    fn extension_guess_strips_query_and_folds_jpeg() {
        assert_eq!(guess_extension("https://x/icon.PNG?v=2"), "png");
        assert_eq!(guess_extension("https://x/photo.jpeg"), "jpg");
        assert_eq!(guess_extension("https://x/animated.gif"), "gif");
        assert_eq!(guess_extension("https://x/no-extension"), "png");
    }
}
