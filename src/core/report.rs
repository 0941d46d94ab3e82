use crate::core::extractor::{self, GLOBAL_LAT_THRESHOLD, GLOBAL_LON_THRESHOLD};
use crate::core::pdf;
use crate::domain::model::{GroupReport, Layer, OutputGroup, Provenance, Sheet};
use crate::domain::ports::{ReportSink, Storage};
use crate::utils::error::Result;
use std::io::Write;
use url::Url;
use zip::write::{FileOptions, ZipWriter};

pub type Column = (&'static str, &'static str);

/// 報表欄位 (key, 標題)，順序即輸出順序
pub const BASE_COLUMNS: [Column; 12] = [
    ("name", "Layer Name"),
    ("title", "Title"),
    ("abstract", "Abstract"),
    ("queryable", "Queryable"),
    ("crs", "CRS"),
    ("west_bound", "West Bound Lon"),
    ("east_bound", "East Bound Lon"),
    ("north_bound", "North Bound Lat"),
    ("south_bound", "South Bound Lat"),
    ("is_global", "Is Global"),
    ("style_names", "Style Name(s)"),
    ("keyword_list", "Keywords"),
];

/// 從 URL 取 host 當檔名 slug。
///
/// `https://dev.quarticle.ro/graph/api/v1/login` → `dev.quarticle.ro`，
/// `http://localhost:4200/graph/api/v1/login` → `localhost`。
pub fn url_slug(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

/// 輸出檔名編碼：時間戳、slug、來源（live/cached）、細節層級、模式。
/// 時間戳精度到秒，同秒同群組的兩次執行允許撞名。
pub fn output_file_name(
    slug: &str,
    timestamp: &str,
    provenance: Provenance,
    full_details: bool,
    pdf_mode: bool,
) -> String {
    let detail_suffix = if full_details { "" } else { "_names" };
    let mode_suffix = if pdf_mode { "_pdf" } else { "" };
    format!(
        "{}_{}_{}{}{}_layers.zip",
        timestamp, slug, provenance, detail_suffix, mode_suffix
    )
}

/// 把一個 OutputGroup 組成交給 sink 的報表：
/// 每個來源文件一張 sheet，整群組一個輸出檔
pub fn assemble_group(group: &OutputGroup, pdf_mode: bool, timestamp: &str) -> GroupReport {
    let columns: Vec<Column> = if pdf_mode {
        pdf::active_columns()
    } else {
        BASE_COLUMNS.to_vec()
    };

    let sheets = group
        .results
        .iter()
        .map(|result| {
            let rows = result
                .layers
                .iter()
                .map(|layer| layer_row(layer, &columns, group.full_details))
                .collect();
            let highlight_rows = result
                .layers
                .iter()
                .enumerate()
                .filter(|(_, layer)| {
                    layer
                        .bbox
                        .as_ref()
                        .is_some_and(extractor::is_global_bbox)
                })
                .map(|(index, _)| index)
                .collect();
            Sheet {
                name: sheet_name(&result.source),
                rows,
                highlight_rows,
            }
        })
        .collect();

    let file_name = output_file_name(
        &group.slug,
        timestamp,
        group.provenance,
        group.full_details,
        pdf_mode,
    );

    GroupReport {
        group_name: group.group_name.clone(),
        relative_path: format!("{}/{}", group.slug, file_name),
        columns,
        sheets,
        pdf_mode,
    }
}

fn sheet_name(source: &str) -> String {
    source.strip_suffix(".json").unwrap_or(source).to_string()
}

fn layer_row(layer: &Layer, columns: &[Column], full_details: bool) -> Vec<String> {
    columns
        .iter()
        .map(|(key, _)| field_value(layer, key, full_details))
        .collect()
}

fn field_value(layer: &Layer, key: &str, full_details: bool) -> String {
    match key {
        "name" => layer.name.clone(),
        "title" => layer.title.clone(),
        "abstract" => layer.abstract_text.clone(),
        "queryable" => layer
            .queryable
            .map(|flag| if flag { "1" } else { "0" }.to_string())
            .unwrap_or_default(),
        "crs" => layer
            .crs
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
        "west_bound" => bound_value(layer, |bbox| bbox.west),
        "east_bound" => bound_value(layer, |bbox| bbox.east),
        "north_bound" => bound_value(layer, |bbox| bbox.north),
        "south_bound" => bound_value(layer, |bbox| bbox.south),
        // names-only 列只保留 name；Is Global 與 PDF V2 也必須留白
        "is_global" => {
            if !full_details {
                String::new()
            } else if layer.bbox.as_ref().is_some_and(extractor::is_global_bbox) {
                "Yes".to_string()
            } else {
                "No".to_string()
            }
        }
        "style_names" => layer.styles.join(", "),
        "keyword_list" => layer.keywords.join(", "),
        "pdf_v2" => {
            if !full_details {
                String::new()
            } else {
                layer
                    .pdf_suffix
                    .clone()
                    .unwrap_or_else(|| pdf::NO_PDF_LABEL.to_string())
            }
        }
        _ => String::new(),
    }
}

fn bound_value(layer: &Layer, pick: fn(&crate::domain::model::BBox) -> f64) -> String {
    layer
        .bbox
        .as_ref()
        .map(|bbox| pick(bbox).to_string())
        .unwrap_or_default()
}

fn column_descriptions(pdf_mode: bool) -> Vec<(String, String)> {
    let mut descriptions = vec![
        (
            "Layer Name".to_string(),
            "The WMS layer identifier (e.g. GRAPHRASTER:fires_final).".to_string(),
        ),
        (
            "Title".to_string(),
            "Human-readable display name of the layer.".to_string(),
        ),
        (
            "Abstract".to_string(),
            "Brief description of the layer's content or purpose.".to_string(),
        ),
        (
            "Queryable".to_string(),
            "1 = layer supports GetFeatureInfo requests; 0 = display-only.".to_string(),
        ),
        (
            "CRS".to_string(),
            "Comma-separated list of supported coordinate reference systems.".to_string(),
        ),
        (
            "West Bound Lon".to_string(),
            "Western edge of the bounding box in decimal degrees (-180 to 180).".to_string(),
        ),
        (
            "East Bound Lon".to_string(),
            "Eastern edge of the bounding box in decimal degrees (-180 to 180).".to_string(),
        ),
        (
            "North Bound Lat".to_string(),
            "Northern edge of the bounding box in decimal degrees (-90 to 90).".to_string(),
        ),
        (
            "South Bound Lat".to_string(),
            "Southern edge of the bounding box in decimal degrees (-90 to 90).".to_string(),
        ),
        (
            "Is Global".to_string(),
            format!(
                "'Yes' when the layer's bbox spans >= {}° longitude AND >= {}° latitude, \
                 indicating worldwide coverage. 'No' for regional or country-level layers.",
                GLOBAL_LON_THRESHOLD, GLOBAL_LAT_THRESHOLD
            ),
        ),
        (
            "Style Name(s)".to_string(),
            "Comma-separated WMS style names available for this layer.".to_string(),
        ),
        (
            "Keywords".to_string(),
            "Full keyword_list from the capabilities document, comma-separated.".to_string(),
        ),
    ];

    if pdf_mode {
        let position = descriptions
            .iter()
            .position(|(label, _)| label == "Is Global")
            .map(|index| index + 1)
            .unwrap_or(descriptions.len());
        descriptions.insert(position, pdf::pdf_column_description());
    }

    descriptions
}

fn sheet_csv(columns: &[Column], sheet: &Sheet) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(columns.iter().map(|(_, label)| *label))?;
        for row in &sheet.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
    }
    Ok(buf)
}

/// Legend sheet：highlight 指示 + 欄位說明。
/// 列號以表格列計（資料從第 2 列起），對齊 highlight 指示的語意
fn legend_csv(report: &GroupReport) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(["Section", "Item", "Description"])?;
        writer.write_record([
            "Row Highlight Key",
            "Global layer",
            "Row flagged for highlighting: bbox qualifies as worldwide coverage (Is Global = Yes).",
        ])?;

        for sheet in &report.sheets {
            let rows = if sheet.highlight_rows.is_empty() {
                "none".to_string()
            } else {
                sheet
                    .highlight_rows
                    .iter()
                    .map(|index| (index + 2).to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            writer.write_record(["Highlighted Rows", sheet.name.as_str(), rows.as_str()])?;
        }

        for (label, description) in column_descriptions(report.pdf_mode) {
            writer.write_record([
                "Column Descriptions",
                label.as_str(),
                description.as_str(),
            ])?;
        }
        writer.flush()?;
    }
    Ok(buf)
}

/// 報表 sink 的 zip-of-CSV 實作：每張 sheet 一個 CSV 成員，加上 legend
pub struct ZipCsvReportWriter<S: Storage> {
    storage: S,
}

impl<S: Storage> ZipCsvReportWriter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: Storage> ReportSink for ZipCsvReportWriter<S> {
    async fn write_report(&self, report: &GroupReport) -> Result<String> {
        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            for sheet in &report.sheets {
                zip.start_file::<_, ()>(format!("{}.csv", sheet.name), FileOptions::default())?;
                let sheet_bytes = sheet_csv(&report.columns, sheet)?;
                zip.write_all(&sheet_bytes)?;
            }

            zip.start_file::<_, ()>("legend.csv", FileOptions::default())?;
            let legend_bytes = legend_csv(report)?;
            zip.write_all(&legend_bytes)?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!(
            "💾 {}: writing report ({} bytes)",
            report.relative_path,
            zip_data.len()
        );
        self.storage.write_file(&report.relative_path, &zip_data).await?;

        Ok(report.relative_path.clone())
    }
}
