use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 一組登入憑證與端點設定，對應一個 `<group>.<environment>` 憑證檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSet {
    pub group: String,
    pub environment: String,
    pub username: String,
    pub password: String,
    pub login_url: String,
    pub get_capabilities_url: String,
    pub base_url: Option<String>,
    pub ssl_verify: bool,
    pub full_layer_details: bool,
}

impl CredentialSet {
    /// Identity key `group/environment`, used for cache paths and log targets.
    pub fn identity(&self) -> String {
        format!("{}/{}", self.group, self.environment)
    }
}

/// Geographic bounding box in decimal degrees. `east >= west` is NOT an
/// invariant here: inputs may be malformed or antimeridian-crossing, so span
/// computations use the absolute difference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub west: f64,
    pub east: f64,
    pub north: f64,
    pub south: f64,
}

impl BBox {
    pub fn lon_span(&self) -> f64 {
        (self.east - self.west).abs()
    }

    pub fn lat_span(&self) -> f64 {
        (self.north - self.south).abs()
    }
}

/// 從 capabilities 文件的單一節點萃取出的 hazardlookup 圖層
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layer {
    pub name: String,
    pub title: String,
    pub abstract_text: String,
    pub queryable: Option<bool>,
    pub crs: BTreeSet<String>,
    pub bbox: Option<BBox>,
    pub styles: Vec<String>,
    pub keywords: Vec<String>,
    pub pdf_suffix: Option<String>,
}

/// One capabilities document worth of extracted layers, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub source: String,
    pub layers: Vec<Layer>,
}

/// 文件來源：本次執行即時抓取，或讀自快取
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Live,
    Cached,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Live => write!(f, "live"),
            Provenance::Cached => write!(f, "cached"),
        }
    }
}

/// 一個輸出群組：一個憑證 group 或 input/ 子目錄，對應一份報表檔
#[derive(Debug, Clone)]
pub struct OutputGroup {
    pub group_name: String,
    pub slug: String,
    pub provenance: Provenance,
    pub full_details: bool,
    pub results: Vec<ExtractionResult>,
}

/// One rendered sheet: a table of string cells plus the indices of rows the
/// sink should highlight (worldwide-coverage layers).
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
    pub highlight_rows: Vec<usize>,
}

/// Finished report for one OutputGroup, ready for a `ReportSink`.
#[derive(Debug, Clone)]
pub struct GroupReport {
    pub group_name: String,
    /// Path relative to the output root, e.g. `slug/20240131_120000_slug_live_layers.zip`.
    pub relative_path: String,
    pub columns: Vec<(&'static str, &'static str)>,
    pub sheets: Vec<Sheet>,
    pub pdf_mode: bool,
}
