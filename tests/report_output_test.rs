use layer_harvester::core::report::{self, ZipCsvReportWriter};
use layer_harvester::domain::model::{
    BBox, ExtractionResult, Layer, OutputGroup, Provenance,
};
use layer_harvester::domain::ports::ReportSink;
use layer_harvester::LocalStorage;
use std::io::Read;
use tempfile::TempDir;

fn fires_layer() -> Layer {
    Layer {
        name: "GRAPHRASTER:fires_final".to_string(),
        title: "Fires".to_string(),
        abstract_text: "Active fires".to_string(),
        queryable: Some(true),
        crs: ["EPSG:4326".to_string()].into_iter().collect(),
        bbox: Some(BBox {
            west: -179.0,
            east: 179.0,
            north: 85.0,
            south: -85.0,
        }),
        styles: vec!["default".to_string()],
        keywords: vec!["hazardlookup".to_string()],
        pdf_suffix: None,
    }
}

fn floods_layer() -> Layer {
    Layer {
        name: "GRAPHRASTER:floods".to_string(),
        title: "Floods".to_string(),
        abstract_text: String::new(),
        queryable: Some(false),
        crs: ["EPSG:4326".to_string()].into_iter().collect(),
        bbox: Some(BBox {
            west: 5.0,
            east: 15.0,
            north: 50.0,
            south: 42.0,
        }),
        styles: vec![],
        keywords: vec![
            "hazardlookup".to_string(),
            "pdf:hazardlookup:local".to_string(),
        ],
        pdf_suffix: Some("local".to_string()),
    }
}

fn sample_group() -> OutputGroup {
    OutputGroup {
        group_name: "quarticle".to_string(),
        slug: "dev.quarticle.ro".to_string(),
        provenance: Provenance::Live,
        full_details: true,
        results: vec![
            ExtractionResult {
                source: "dev.json".to_string(),
                layers: vec![fires_layer(), floods_layer()],
            },
            ExtractionResult {
                source: "staging.json".to_string(),
                layers: vec![floods_layer()],
            },
        ],
    }
}

fn member_text(archive: &mut zip::ZipArchive<std::fs::File>, name: &str) -> String {
    let mut member = archive.by_name(name).unwrap();
    let mut content = String::new();
    member.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn test_workbook_contains_one_sheet_per_document_plus_legend() {
    let out = TempDir::new().unwrap();
    let sink = ZipCsvReportWriter::new(LocalStorage::new(
        out.path().to_str().unwrap().to_string(),
    ));

    let group_report = report::assemble_group(&sample_group(), false, "20240131_120000");
    let written = sink.write_report(&group_report).await.unwrap();

    assert_eq!(
        written,
        "dev.quarticle.ro/20240131_120000_dev.quarticle.ro_live_layers.zip"
    );

    let file = std::fs::File::open(out.path().join(&written)).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();

    let mut member_names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    member_names.sort();
    assert_eq!(member_names, vec!["dev.csv", "legend.csv", "staging.csv"]);

    let dev_sheet = member_text(&mut archive, "dev.csv");
    let mut lines = dev_sheet.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("Layer Name,Title,Abstract,Queryable"));
    assert_eq!(lines.count(), 2);

    assert!(dev_sheet.contains("GRAPHRASTER:fires_final"));
    assert!(dev_sheet.contains("Yes"));
    assert!(dev_sheet.contains("GRAPHRASTER:floods"));
}

#[tokio::test]
async fn test_legend_lists_highlighted_rows_and_columns() {
    let out = TempDir::new().unwrap();
    let sink = ZipCsvReportWriter::new(LocalStorage::new(
        out.path().to_str().unwrap().to_string(),
    ));

    let group_report = report::assemble_group(&sample_group(), false, "20240131_120000");
    let written = sink.write_report(&group_report).await.unwrap();

    let file = std::fs::File::open(out.path().join(&written)).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let legend = member_text(&mut archive, "legend.csv");

    // fires is the only global layer: data row 2 of the dev sheet
    assert!(legend.contains("Highlighted Rows,dev,2"));
    assert!(legend.contains("Highlighted Rows,staging,none"));
    assert!(legend.contains("Layer Name"));
    assert!(legend.contains("worldwide coverage"));
    // base report carries no PDF V2 description
    assert!(!legend.contains("PDF V2"));
}

#[tokio::test]
async fn test_pdf_mode_workbook() {
    let out = TempDir::new().unwrap();
    let sink = ZipCsvReportWriter::new(LocalStorage::new(
        out.path().to_str().unwrap().to_string(),
    ));

    let group_report = report::assemble_group(&sample_group(), true, "20240131_120000");
    let written = sink.write_report(&group_report).await.unwrap();

    assert!(written.ends_with("_pdf_layers.zip"));

    let file = std::fs::File::open(out.path().join(&written)).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();

    let dev_sheet = member_text(&mut archive, "dev.csv");
    let header = dev_sheet.lines().next().unwrap();
    assert!(header.contains("Is Global,PDF V2"));
    assert!(dev_sheet.contains("not attached to PDF V2"));
    assert!(dev_sheet.contains("local"));

    let legend = member_text(&mut archive, "legend.csv");
    assert!(legend.contains("PDF V2"));
}

#[tokio::test]
async fn test_names_only_naming_and_rows() {
    let out = TempDir::new().unwrap();
    let sink = ZipCsvReportWriter::new(LocalStorage::new(
        out.path().to_str().unwrap().to_string(),
    ));

    let mut group = sample_group();
    group.full_details = false;
    group.provenance = Provenance::Cached;
    for result in &mut group.results {
        for layer in &mut result.layers {
            *layer = Layer {
                name: layer.name.clone(),
                ..Layer::default()
            };
        }
    }

    let group_report = report::assemble_group(&group, false, "20240131_120000");
    let written = sink.write_report(&group_report).await.unwrap();

    assert_eq!(
        written,
        "dev.quarticle.ro/20240131_120000_dev.quarticle.ro_cached_names_layers.zip"
    );

    let file = std::fs::File::open(out.path().join(&written)).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let dev_sheet = member_text(&mut archive, "dev.csv");

    for line in dev_sheet.lines().skip(1) {
        let cells: Vec<&str> = line.split(',').collect();
        let non_empty: Vec<&&str> = cells.iter().filter(|cell| !cell.is_empty()).collect();
        assert_eq!(non_empty.len(), 1, "row should only carry the name: {line}");
    }
}
