//! Catalog file loading and cleaning
//!
//! Accepts either a JSON array of rows or JSON lines. Rows missing any key
//! attribute are dropped, text fields are lowercased and trimmed, and
//! comma-separated colours are split into tags.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tailor_core::CatalogRecord;

/// A catalog row as it appears in the source file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalogRow {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub article_type: Option<String>,
    #[serde(default)]
    pub usage: Option<String>,
    #[serde(default)]
    pub base_colour: Option<Value>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default, alias = "productDisplayName")]
    pub display_name: Option<String>,
}

/// Row counts from one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    pub kept: usize,
    pub incomplete: usize,
    pub duplicates: usize,
}

/// Load and clean a catalog file
pub fn load_catalog(path: impl AsRef<Path>, images_dir: impl AsRef<Path>) -> Result<Vec<CatalogRecord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let rows = parse_rows(&content)
        .with_context(|| format!("Failed to parse catalog {}", path.display()))?;

    let (records, report) = clean_rows(rows, images_dir.as_ref());
    tracing::info!(
        path = %path.display(),
        rows = report.rows,
        kept = report.kept,
        incomplete = report.incomplete,
        duplicates = report.duplicates,
        "Catalog loaded"
    );
    Ok(records)
}

/// Parse either a JSON array or newline-delimited JSON objects
pub fn parse_rows(content: &str) -> Result<Vec<RawCatalogRow>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid catalog row on line {}", n + 1))
        })
        .collect()
}

/// Clean raw rows into catalog records, keeping the first row for each id
pub fn clean_rows(rows: Vec<RawCatalogRow>, images_dir: &Path) -> (Vec<CatalogRecord>, LoadReport) {
    let mut report = LoadReport {
        rows: rows.len(),
        ..Default::default()
    };
    let mut seen = HashSet::with_capacity(rows.len());
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(record) = clean_row(row, images_dir) else {
            report.incomplete += 1;
            continue;
        };
        if !seen.insert(record.id) {
            report.duplicates += 1;
            continue;
        }
        records.push(record);
    }

    report.kept = records.len();
    (records, report)
}

fn clean_row(row: RawCatalogRow, images_dir: &Path) -> Option<CatalogRecord> {
    let id = parse_id(row.id.as_ref()?)?;
    let base_colour = split_colours(row.base_colour.as_ref()?);
    if base_colour.is_empty() {
        return None;
    }

    Some(CatalogRecord {
        id,
        gender: clean_text(row.gender)?,
        article_type: clean_text(row.article_type)?,
        usage: clean_text(row.usage)?,
        season: clean_text(row.season)?,
        base_colour,
        material: clean_text(row.material),
        display_name: row
            .display_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        image_path: images_dir.join(format!("{}.jpg", id)).to_string_lossy().into_owned(),
    })
}

fn parse_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn clean_text(value: Option<String>) -> Option<String> {
    let value = value?.trim().to_lowercase();
    (!value.is_empty()).then_some(value)
}

fn split_colours(value: &Value) -> Vec<String> {
    let parts: Vec<&str> = match value {
        Value::String(s) => s.split(',').collect(),
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    let mut colours: Vec<String> = Vec::with_capacity(parts.len());
    for part in parts {
        let colour = part.trim().to_lowercase();
        if !colour.is_empty() && !colours.contains(&colour) {
            colours.push(colour);
        }
    }
    colours
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ROWS: &str = r#"[
        {"id": 15970, "gender": "Men", "articleType": "Shirts", "usage": "Casual", "baseColour": "Navy Blue", "season": "Fall", "productDisplayName": "Turtle Check Men Navy Blue Shirt"},
        {"id": "39386", "gender": "Women", "articleType": "Dresses", "usage": " Party ", "baseColour": "Red, Black", "season": "Summer"},
        {"id": 59263, "gender": "Women", "articleType": "Watches", "usage": null, "baseColour": "Silver", "season": "Winter"},
        {"id": 15970, "gender": "Men", "articleType": "Jeans", "usage": "Casual", "baseColour": "Blue", "season": "Fall"},
        {"gender": "Men", "articleType": "Tshirts", "usage": "Sports", "baseColour": "Grey", "season": "Summer"}
    ]"#;

    #[test]
    fn test_clean_rows() {
        let rows = parse_rows(ROWS).unwrap();
        let (records, report) = clean_rows(rows, Path::new("images"));

        assert_eq!(
            report,
            LoadReport {
                rows: 5,
                kept: 2,
                incomplete: 2,
                duplicates: 1
            }
        );

        assert_eq!(records[0].id, 15970);
        assert_eq!(records[0].article_type, "shirts");
        assert_eq!(records[0].base_colour, vec!["navy blue"]);
        assert_eq!(
            records[0].display_name.as_deref(),
            Some("Turtle Check Men Navy Blue Shirt")
        );
        assert_eq!(records[0].image_path, Path::new("images").join("15970.jpg").to_string_lossy());

        assert_eq!(records[1].id, 39386);
        assert_eq!(records[1].usage, "party");
        assert_eq!(records[1].base_colour, vec!["red", "black"]);
        assert!(records.iter().all(CatalogRecord::is_valid));
    }

    #[test]
    fn test_json_lines() {
        let content = "{\"id\": 1, \"gender\": \"Women\", \"articleType\": \"Tops\", \"usage\": \"Casual\", \"baseColour\": [\"White\"], \"season\": \"Summer\"}\n\n{\"id\": 2, \"gender\": \"Men\", \"articleType\": \"Jeans\", \"usage\": \"Casual\", \"baseColour\": \"Blue\", \"season\": \"Fall\"}\n";
        let rows = parse_rows(content).unwrap();
        assert_eq!(rows.len(), 2);

        let (records, _) = clean_rows(rows, Path::new("img"));
        assert_eq!(records[0].base_colour, vec!["white"]);
        assert_eq!(records[1].gender, "men");
    }

    #[test]
    fn test_invalid_json_line_reports_position() {
        let err = parse_rows("{\"id\": 1}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_load_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ROWS.as_bytes()).unwrap();

        let records = load_catalog(file.path(), "images").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        assert!(load_catalog("/nonexistent/styles.json", "images").is_err());
    }
}
