use clap::Parser;
use layer_harvester::config::credentials;
use layer_harvester::core::orchestrator::{Orchestrator, RunOptions};
use layer_harvester::core::{pdf, report};
use layer_harvester::domain::model::ExtractionResult;
use layer_harvester::domain::ports::ReportSink;
use layer_harvester::utils::{logger, validation::Validate};
use layer_harvester::{
    CliConfig, HarvestError, HttpCapabilitySource, LocalStorage, ZipCsvReportWriter,
};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting layer-harvester");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let pdf_mode = config.pdf_mode();
    if pdf_mode {
        tracing::info!("📄 PDF mode: PDF V2 column and breakdown enabled");
    }

    let options = RunOptions {
        env_files: config.env_files.iter().map(PathBuf::from).collect(),
        no_fetch: config.no_fetch,
        pdf_mode,
        default_full_details: credentials::env_flag_default("FULL_LAYER_DETAILS"),
    };

    let orchestrator = Orchestrator::new(
        HttpCapabilitySource::new(),
        LocalStorage::new(config.input_dir.clone()),
        config.envs_dir.clone(),
    );

    let run_report = match orchestrator.run(&options).await {
        Ok(run_report) => run_report,
        Err(HarvestError::NothingToDo) => {
            // 非致命的終止狀態：照實回報後正常結束
            tracing::info!(
                "📂 Nothing to do: no credential files in {} and no cached documents in {}",
                config.envs_dir,
                config.input_dir
            );
            println!("Nothing to do: no credential files and no cached documents.");
            return Ok(());
        }
        Err(e) => {
            tracing::error!("❌ Harvest run failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    if run_report.cache_fallback {
        tracing::info!(
            "📂 Using cached documents from {} (no credential files found)",
            config.input_dir
        );
    }

    // 組報表並寫出
    let sink = ZipCsvReportWriter::new(LocalStorage::new(config.output_path.clone()));
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

    let mut saved_files = Vec::new();
    let mut write_failures = 0usize;
    for group in &run_report.groups {
        let group_report = report::assemble_group(group, pdf_mode, &timestamp);
        let display_name = if group.group_name.is_empty() {
            "(root)"
        } else {
            group.group_name.as_str()
        };

        match sink.write_report(&group_report).await {
            Ok(path) => {
                tracing::info!("💾 {} → {}/{}", display_name, config.output_path, path);
                for result in &group.results {
                    summarize_document(result, pdf_mode);
                }
                saved_files.push(path);
            }
            Err(e) => {
                tracing::error!("❌ {}: {}", display_name, e);
                write_failures += 1;
            }
        }
    }

    // 逐項失敗都進總結，不吞掉任何一筆
    for (scope, error) in &run_report.failures {
        tracing::warn!("❌ {}: {}", scope, error);
    }

    let failure_total = run_report.failures.len() + write_failures;
    if failure_total > 0 {
        println!(
            "⚠️ Completed with {} failure(s), see log for details.",
            failure_total
        );
    }

    tracing::info!(
        "✅ Harvest complete: {} document(s), {} layer(s), {} report file(s)",
        run_report.total_documents(),
        run_report.total_layers(),
        saved_files.len()
    );
    println!(
        "✅ Harvest complete: {} report file(s) written to {}",
        saved_files.len(),
        config.output_path
    );

    Ok(())
}

fn summarize_document(result: &ExtractionResult, pdf_mode: bool) {
    if pdf_mode {
        let (mut types, counts) = pdf::collect_pdf_counts(&result.layers);
        types.sort_by_key(|tag| pdf::sort_key(tag));
        let breakdown: Vec<String> = types
            .iter()
            .map(|tag| format!("{}: {}", tag, counts[tag]))
            .collect();
        tracing::info!(
            "  📄 {}: {} layer(s) [{}]",
            result.source,
            result.layers.len(),
            breakdown.join(", ")
        );
    } else {
        tracing::info!("  📄 {}: {} layer(s)", result.source, result.layers.len());
    }
}
