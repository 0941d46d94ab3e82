use crate::domain::model::{BBox, Layer};
use crate::utils::error::{HarvestError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// 選層關鍵字：keyword_list 必須含有完全一致（區分大小寫）的這個字串
pub const HAZARD_KEYWORD: &str = "hazardlookup";

/// PDF V2 變體關鍵字前綴，完整形式 `pdf:hazardlookup:<suffix>`
pub const PDF_HAZARD_PREFIX: &str = "pdf:hazardlookup:";

// Bbox 門檻為固定常數，不可設定
pub const GLOBAL_LON_THRESHOLD: f64 = 340.0;
pub const GLOBAL_LAT_THRESHOLD: f64 = 120.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// false 時只輸出 name，其餘欄位留白；選層不受影響
    pub full_details: bool,
    /// PDF 模式才萃取 `pdf:hazardlookup:` 關鍵字
    pub pdf_variants: bool,
}

/// bbox 覆蓋幾乎整個世界時回傳 true。
///
/// 跨距取絕對差：west > east 的跨換日線輸入不做符號校正，
/// 170°→−170° 的 box 跨距視為 340°。
pub fn is_global_bbox(bbox: &BBox) -> bool {
    bbox.lon_span() >= GLOBAL_LON_THRESHOLD && bbox.lat_span() >= GLOBAL_LAT_THRESHOLD
}

/// 走訪 capabilities 文件，收集帶 hazardlookup 關鍵字的圖層。
///
/// 圖層可藏在任意深度的父群組下；用明確的 worklist 走訪，不依賴遞迴深度。
/// 子節點反序入疊，圖層照文件宣告順序彈出。選中的節點不再往下走。
pub fn extract_layers(
    document: &Value,
    source_name: &str,
    options: &ExtractOptions,
) -> Result<Vec<Layer>> {
    if !document.is_object() && !document.is_array() {
        return Err(HarvestError::DocumentParse {
            source_name: source_name.to_string(),
            message: "root is neither a JSON object nor an array".to_string(),
        });
    }

    let mut layers = Vec::new();
    let mut stack: Vec<&Value> = vec![document];

    while let Some(node) = stack.pop() {
        match node {
            Value::Object(obj) => {
                if has_hazard_keyword(obj) {
                    layers.push(build_layer(obj, source_name, options));
                } else {
                    for child in obj.values().rev() {
                        stack.push(child);
                    }
                }
            }
            Value::Array(items) => {
                for child in items.iter().rev() {
                    stack.push(child);
                }
            }
            _ => {}
        }
    }

    Ok(layers)
}

fn has_hazard_keyword(obj: &Map<String, Value>) -> bool {
    match obj.get("keyword_list") {
        Some(Value::Array(keywords)) => keywords
            .iter()
            .any(|keyword| keyword.as_str() == Some(HAZARD_KEYWORD)),
        _ => false,
    }
}

/// 回傳第一個 `pdf:hazardlookup:<suffix>` 關鍵字的小寫 suffix；
/// 前綴比對不分大小寫，多個時第一個勝出
pub fn pdf_suffix(keywords: &[String]) -> Option<String> {
    keywords.iter().find_map(|keyword| {
        keyword
            .to_lowercase()
            .strip_prefix(PDF_HAZARD_PREFIX)
            .map(|suffix| suffix.to_string())
    })
}

fn build_layer(obj: &Map<String, Value>, source_name: &str, options: &ExtractOptions) -> Layer {
    let name = string_field(obj.get("name"));

    if !options.full_details {
        return Layer {
            name,
            ..Layer::default()
        };
    }

    let keywords = keyword_strings(obj.get("keyword_list"));
    let pdf_suffix = if options.pdf_variants {
        pdf_suffix(&keywords)
    } else {
        None
    };

    Layer {
        title: string_field(obj.get("title")),
        abstract_text: string_field(obj.get("abstract")).trim().to_string(),
        queryable: queryable_flag(obj.get("queryable"), &name, source_name),
        crs: crs_set(obj.get("CRS")),
        bbox: geographic_bbox(obj.get("ex_geographic_bounding_box"), &name, source_name),
        styles: style_names(obj.get("style")),
        keywords,
        pdf_suffix,
        name,
    }
}

fn string_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn keyword_strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|keyword| string_field(Some(keyword)))
            .collect(),
        _ => Vec::new(),
    }
}

fn queryable_flag(value: Option<&Value>, layer: &str, source_name: &str) -> Option<bool> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Bool(flag)) => Some(*flag),
        Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0),
        Some(other) => {
            tracing::warn!(
                "🔶 {}: layer '{}' has an unusable queryable flag: {}",
                source_name,
                layer,
                other
            );
            None
        }
    }
}

fn crs_set(value: Option<&Value>) -> BTreeSet<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|crs| crs.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(crs)) => BTreeSet::from([crs.clone()]),
        _ => BTreeSet::new(),
    }
}

fn style_names(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(styles)) => styles
            .iter()
            .filter_map(|style| style.as_object())
            .map(|style| string_field(style.get("name")))
            .collect(),
        _ => Vec::new(),
    }
}

fn number_field(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 讀 `ex_geographic_bounding_box`；四個邊界少任何一個就整個留空，
/// 並記一筆 warning，不中斷其餘圖層
fn geographic_bbox(value: Option<&Value>, layer: &str, source_name: &str) -> Option<BBox> {
    let bbox = match value {
        Some(Value::Object(map)) => map,
        _ => {
            tracing::warn!(
                "🔶 {}: layer '{}' has no geographic bounding box",
                source_name,
                layer
            );
            return None;
        }
    };

    let west = number_field(bbox.get("west_bound_longitude"));
    let east = number_field(bbox.get("east_bound_longitude"));
    let north = number_field(bbox.get("north_bound_latitude"));
    let south = number_field(bbox.get("south_bound_latitude"));

    match (west, east, north, south) {
        (Some(west), Some(east), Some(north), Some(south)) => Some(BBox {
            west,
            east,
            north,
            south,
        }),
        _ => {
            tracing::warn!(
                "🔶 {}: layer '{}' bounding box is incomplete",
                source_name,
                layer
            );
            None
        }
    }
}
