use crate::config::credentials;
use crate::core::extractor::{self, ExtractOptions};
use crate::core::report;
use crate::domain::model::{
    CredentialSet, ExtractionResult, OutputGroup, Provenance,
};
use crate::domain::ports::{CapabilitySource, Storage};
use crate::utils::error::{HarvestError, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

/// 每次執行解析一次的選項；之後不再讀任何環境狀態
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 明確指定的憑證檔；非空時只抓這些（FetchExplicit）
    pub env_files: Vec<PathBuf>,
    /// 即使憑證檔存在也不抓取，直接讀快取
    pub no_fetch: bool,
    pub pdf_mode: bool,
    /// 憑證組沒有自己的旗標時的全程預設（啟動時從環境解析一次）
    pub default_full_details: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            env_files: Vec::new(),
            no_fetch: false,
            pdf_mode: false,
            default_full_details: true,
        }
    }
}

/// 一次執行的完整結果：輸出群組 + 收集到的每項失敗。
/// 除了 NothingToDo 之外，任何單項失敗都不會中止整批。
#[derive(Debug, Default)]
pub struct RunReport {
    pub groups: Vec<OutputGroup>,
    pub failures: Vec<(String, HarvestError)>,
    /// 找不到憑證檔、退回快取時為 true
    pub cache_fallback: bool,
}

impl RunReport {
    pub fn total_documents(&self) -> usize {
        self.groups.iter().map(|g| g.results.len()).sum()
    }

    pub fn total_layers(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.results.iter())
            .map(|r| r.layers.len())
            .sum()
    }
}

/// 群組層級的命名與細節設定，取自該群組第一個憑證組
struct GroupMeta {
    slug: Option<String>,
    full_details: bool,
}

fn build_group_meta(credential_sets: &[CredentialSet]) -> HashMap<String, GroupMeta> {
    let mut meta: HashMap<String, GroupMeta> = HashMap::new();
    for credentials in credential_sets {
        meta.entry(credentials.group.clone()).or_insert_with(|| {
            let raw = credentials
                .base_url
                .as_deref()
                .unwrap_or(&credentials.login_url);
            GroupMeta {
                slug: report::url_slug(raw),
                full_details: credentials.full_layer_details,
            }
        });
    }
    meta
}

fn load_explicit(paths: &[PathBuf]) -> (Vec<CredentialSet>, Vec<(String, HarvestError)>) {
    let mut sets = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        match credentials::credential_from_path(path) {
            Ok(set) => sets.push(set),
            Err(e) => failures.push((path.display().to_string(), e)),
        }
    }
    (sets, failures)
}

/// 來源決策流程：
/// Start → FetchExplicit | ScanCache | ScanCredentials → FetchAll → Done。
/// fetch 埠可替換，測試不走真網路。
pub struct Orchestrator<F: CapabilitySource, S: Storage> {
    fetcher: F,
    /// 以快取（input）目錄為根
    storage: S,
    envs_dir: PathBuf,
}

impl<F: CapabilitySource, S: Storage> Orchestrator<F, S> {
    pub fn new(fetcher: F, storage: S, envs_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            storage,
            envs_dir: envs_dir.into(),
        }
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunReport> {
        let mut run_report = RunReport::default();

        let explicit = !options.env_files.is_empty();
        let (credential_sets, credential_errors) = if explicit {
            load_explicit(&options.env_files)
        } else {
            credentials::scan_credentials(&self.envs_dir)
        };
        for (scope, error) in credential_errors {
            tracing::warn!("❌ {}: {}", scope, error);
            run_report.failures.push((scope, error));
        }

        let group_meta = build_group_meta(&credential_sets);

        if explicit {
            // FetchExplicit：只收割本次抓到的文件
            let fetched = self.fetch_batch(&credential_sets, &mut run_report).await;
            let live_groups: HashSet<String> =
                fetched.iter().map(|(group, ..)| group.clone()).collect();

            let mut collected = BTreeMap::new();
            for (group, source_name, document) in &fetched {
                self.attach_document(
                    &mut collected,
                    group,
                    source_name,
                    document,
                    &group_meta,
                    options,
                    &mut run_report,
                );
            }
            run_report.groups = finish_groups(collected, &group_meta, options, &live_groups);
            return Ok(run_report);
        }

        let fallback = !options.no_fetch && credential_sets.is_empty();
        let live_groups: HashSet<String> = if options.no_fetch || fallback {
            if fallback {
                run_report.cache_fallback = true;
                tracing::warn!("📂 No credential files found, falling back to cached documents");
            }
            HashSet::new()
        } else {
            // FetchAll：逐組抓取，之後整個快取一起收割
            let fetched = self.fetch_batch(&credential_sets, &mut run_report).await;
            fetched.into_iter().map(|(group, ..)| group).collect()
        };

        let listing = self.list_cache().await?;
        if listing.is_empty() {
            if options.no_fetch || fallback {
                return Err(HarvestError::NothingToDo);
            }
            // 有憑證但全數失敗且快取是空的：失敗已逐項記錄
            return Ok(run_report);
        }

        let mut collected = BTreeMap::new();
        for (group_dir, files) in &listing {
            for file_name in files {
                let rel_path = if group_dir.is_empty() {
                    file_name.clone()
                } else {
                    format!("{}/{}", group_dir, file_name)
                };

                let bytes = match self.storage.read_file(&rel_path).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!("❌ {}: {}", rel_path, e);
                        run_report.failures.push((rel_path, e));
                        continue;
                    }
                };
                let document: Value = match serde_json::from_slice(&bytes) {
                    Ok(document) => document,
                    Err(e) => {
                        let error = HarvestError::DocumentParse {
                            source_name: rel_path.clone(),
                            message: e.to_string(),
                        };
                        tracing::warn!("❌ {}", error);
                        run_report.failures.push((rel_path, error));
                        continue;
                    }
                };

                self.attach_document(
                    &mut collected,
                    group_dir,
                    file_name,
                    &document,
                    &group_meta,
                    options,
                    &mut run_report,
                );
            }
        }

        run_report.groups = finish_groups(collected, &group_meta, options, &live_groups);
        Ok(run_report)
    }

    /// 逐憑證組抓取；單組失敗記錄後繼續。成功的文件同步寫入快取，
    /// 讓下一次執行可以跳過抓取
    async fn fetch_batch(
        &self,
        credential_sets: &[CredentialSet],
        run_report: &mut RunReport,
    ) -> Vec<(String, String, Value)> {
        let mut fetched = Vec::new();

        for credentials in credential_sets {
            let target = credentials.identity();
            tracing::info!("📡 Fetching capabilities for {}", target);

            match self.fetcher.fetch(credentials).await {
                Ok(document) => {
                    let cache_path =
                        format!("{}/{}.json", credentials.group, credentials.environment);
                    match serde_json::to_vec(&document) {
                        Ok(bytes) => {
                            if let Err(e) = self.storage.write_file(&cache_path, &bytes).await {
                                tracing::warn!("❌ {}: cache write failed: {}", target, e);
                                run_report.failures.push((target.clone(), e));
                            }
                        }
                        Err(e) => run_report.failures.push((target.clone(), e.into())),
                    }
                    tracing::info!("✅ {}: capabilities fetched", target);
                    fetched.push((
                        credentials.group.clone(),
                        format!("{}.json", credentials.environment),
                        document,
                    ));
                }
                Err(e) => {
                    tracing::warn!("❌ {}: {}", target, e);
                    run_report.failures.push((target, e));
                }
            }
        }

        fetched
    }

    /// ScanCache：根目錄的 *.json 是群組 ""，一層子目錄各自成組
    async fn list_cache(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut listing = BTreeMap::new();

        let root_files = self.storage.list_json_files("").await?;
        if !root_files.is_empty() {
            listing.insert(String::new(), root_files);
        }

        for subdir in self.storage.list_subdirs("").await? {
            let files = self.storage.list_json_files(&subdir).await?;
            if !files.is_empty() {
                listing.insert(subdir, files);
            }
        }

        Ok(listing)
    }

    #[allow(clippy::too_many_arguments)]
    fn attach_document(
        &self,
        collected: &mut BTreeMap<String, Vec<ExtractionResult>>,
        group: &str,
        source_name: &str,
        document: &Value,
        group_meta: &HashMap<String, GroupMeta>,
        options: &RunOptions,
        run_report: &mut RunReport,
    ) {
        let full_details = group_meta
            .get(group)
            .map(|meta| meta.full_details)
            .unwrap_or(options.default_full_details);
        let extract_options = ExtractOptions {
            full_details,
            pdf_variants: options.pdf_mode,
        };

        let scope = if group.is_empty() {
            source_name.to_string()
        } else {
            format!("{}/{}", group, source_name)
        };

        match extractor::extract_layers(document, &scope, &extract_options) {
            Ok(layers) => {
                tracing::info!("📥 {}: {} hazardlookup layer(s) extracted", scope, layers.len());
                collected.entry(group.to_string()).or_default().push(ExtractionResult {
                    source: source_name.to_string(),
                    layers,
                });
            }
            Err(e) => {
                tracing::warn!("❌ {}", e);
                run_report.failures.push((scope, e));
            }
        }
    }
}

/// 組裝 OutputGroup：slug 與細節層級取自憑證，沒有對應憑證時
/// 退回目錄名（根群組為 "base"）與全程預設
fn finish_groups(
    collected: BTreeMap<String, Vec<ExtractionResult>>,
    group_meta: &HashMap<String, GroupMeta>,
    options: &RunOptions,
    live_groups: &HashSet<String>,
) -> Vec<OutputGroup> {
    collected
        .into_iter()
        .map(|(group_name, results)| {
            let meta = group_meta.get(&group_name);
            let slug = meta.and_then(|m| m.slug.clone()).unwrap_or_else(|| {
                if group_name.is_empty() {
                    "base".to_string()
                } else {
                    group_name.clone()
                }
            });
            OutputGroup {
                provenance: if live_groups.contains(&group_name) {
                    Provenance::Live
                } else {
                    Provenance::Cached
                },
                full_details: meta
                    .map(|m| m.full_details)
                    .unwrap_or(options.default_full_details),
                group_name,
                slug,
                results,
            }
        })
        .collect()
}
