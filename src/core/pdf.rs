//! PDF V2 模式的輔助：欄位注入、每檔 suffix 統計、摘要排序。
//! 只有 `--mode pdf` 時才會用到。

use crate::core::extractor::PDF_HAZARD_PREFIX;
use crate::core::report::{Column, BASE_COLUMNS};
use crate::domain::model::Layer;
use std::collections::HashMap;

pub const PDF_COLUMN: Column = ("pdf_v2", "PDF V2");
pub const NO_PDF_LABEL: &str = "not attached to PDF V2";

/// 摘要的正規順序；不在表上的 suffix 排在後面
pub const PDF_COL_ORDER: [&str; 3] = ["global:risk", "global:additional", "local"];

/// BASE_COLUMNS 加上 PDF V2，插在 Is Global 之後
pub fn active_columns() -> Vec<Column> {
    let mut columns = BASE_COLUMNS.to_vec();
    let index = columns
        .iter()
        .position(|(key, _)| *key == "is_global")
        .unwrap_or(columns.len() - 1);
    columns.insert(index + 1, PDF_COLUMN);
    columns
}

pub fn pdf_column_description() -> (String, String) {
    (
        "PDF V2".to_string(),
        format!(
            "Suffix extracted from the '{}<keyword>' entry in the keyword_list \
             (e.g. 'local', 'global:risk', 'global:additional'). Shows '{}' when \
             no such keyword is present.",
            PDF_HAZARD_PREFIX, NO_PDF_LABEL
        ),
    )
}

/// 排序鍵：global:risk → global:additional → local → 其他 → 無 PDF 標記。
/// 索引補零，表超過 9 項時仍保持數值順序
pub fn sort_key(tag: &str) -> (u8, String) {
    if tag == NO_PDF_LABEL {
        return (2, String::new());
    }
    match PDF_COL_ORDER.iter().position(|known| *known == tag) {
        Some(index) => (0, format!("{:04}", index)),
        None => (1, tag.to_string()),
    }
}

/// 掃一份文件的圖層，回傳 pdf suffix 的出現順序與次數
pub fn collect_pdf_counts(layers: &[Layer]) -> (Vec<String>, HashMap<String, usize>) {
    let mut all_types = Vec::new();
    let mut counts = HashMap::new();

    for layer in layers {
        let tag = layer
            .pdf_suffix
            .clone()
            .unwrap_or_else(|| NO_PDF_LABEL.to_string());
        *counts.entry(tag.clone()).or_insert(0) += 1;
        if !all_types.contains(&tag) {
            all_types.push(tag);
        }
    }

    (all_types, counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf_layer(name: &str, suffix: Option<&str>) -> Layer {
        Layer {
            name: name.to_string(),
            pdf_suffix: suffix.map(str::to_string),
            ..Layer::default()
        }
    }

    #[test]
    fn test_active_columns_insertion() {
        let columns = active_columns();
        assert_eq!(columns.len(), BASE_COLUMNS.len() + 1);

        let keys: Vec<&str> = columns.iter().map(|(key, _)| *key).collect();
        let is_global_idx = keys.iter().position(|k| *k == "is_global").unwrap();
        assert_eq!(keys[is_global_idx + 1], "pdf_v2");
    }

    #[test]
    fn test_sort_key_canonical_order() {
        let mut tags = vec![
            NO_PDF_LABEL.to_string(),
            "local".to_string(),
            "custom:tag".to_string(),
            "global:additional".to_string(),
            "global:risk".to_string(),
        ];
        tags.sort_by_key(|tag| sort_key(tag));

        assert_eq!(
            tags,
            vec![
                "global:risk",
                "global:additional",
                "local",
                "custom:tag",
                NO_PDF_LABEL
            ]
        );
    }

    #[test]
    fn test_collect_pdf_counts() {
        let layers = vec![
            pdf_layer("a", Some("local")),
            pdf_layer("b", None),
            pdf_layer("c", Some("local")),
            pdf_layer("d", Some("global:risk")),
        ];

        let (all_types, counts) = collect_pdf_counts(&layers);

        // insertion order, unsorted
        assert_eq!(all_types, vec!["local", NO_PDF_LABEL, "global:risk"]);
        assert_eq!(counts["local"], 2);
        assert_eq!(counts[NO_PDF_LABEL], 1);
        assert_eq!(counts["global:risk"], 1);
    }

    #[test]
    fn test_collect_pdf_counts_empty() {
        let (all_types, counts) = collect_pdf_counts(&[]);
        assert!(all_types.is_empty());
        assert!(counts.is_empty());
    }
}
