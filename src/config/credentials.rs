use crate::domain::model::CredentialSet;
use crate::utils::error::{HarvestError, Result};
use crate::utils::validation::validate_url;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// 憑證檔必填欄位；缺一個就整檔拒絕，但不影響其他檔案
const REQUIRED_KEYS: [&str; 4] = ["USERNAME", "PASSWORD", "LOGIN_URL", "GET_CAPABILITIES_URL"];

/// 解析憑證檔名為 `(group, environment)`。
///
/// 接受 `<group>.<environment>` 與點字首/`.env` 字尾的變體：
/// `quarticle.dev`、`.quarticle.dev.env`、`allianz.prod.env` 都可以。
/// 不符合慣例時回傳 `None`（呼叫端記 warning 後跳過）。
pub fn parse_credential_filename(name: &str) -> Option<(String, String)> {
    let inner = name.strip_prefix('.').unwrap_or(name);
    let inner = inner.strip_suffix(".env").unwrap_or(inner);
    let dot = inner.rfind('.')?;
    if dot == 0 || dot == inner.len() - 1 {
        return None;
    }
    Some((inner[..dot].to_string(), inner[dot + 1..].to_string()))
}

/// 替換值裡的 `${VAR}` 為 process 環境變數；未定義的佔位符保留原樣
fn substitute_env_vars(value: &str) -> String {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(value, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

fn parse_bool_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

/// 旗標解析順序：檔案值 → process 環境變數 → true
fn resolve_flag(file_value: Option<&String>, env_key: &str) -> bool {
    match file_value {
        Some(value) => parse_bool_flag(value),
        None => env_flag_default(env_key),
    }
}

/// Process-wide default for an optional flag; unset means `true`.
pub fn env_flag_default(env_key: &str) -> bool {
    std::env::var(env_key)
        .map(|value| parse_bool_flag(&value))
        .unwrap_or(true)
}

fn credential_file_error(path: &Path, message: impl Into<String>) -> HarvestError {
    HarvestError::CredentialFile {
        path: path.display().to_string(),
        message: message.into(),
    }
}

fn parse_credential_file(path: &Path) -> Result<HashMap<String, String>> {
    let entries =
        dotenvy::from_path_iter(path).map_err(|e| credential_file_error(path, e.to_string()))?;

    let mut values = HashMap::new();
    for entry in entries {
        let (key, value) = entry.map_err(|e| credential_file_error(path, e.to_string()))?;
        values.insert(key, substitute_env_vars(&value));
    }
    Ok(values)
}

fn build_credential_set(
    group: String,
    environment: String,
    values: &HashMap<String, String>,
    path: &Path,
) -> Result<CredentialSet> {
    let required = |key: &str| -> Result<String> {
        values
            .get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| credential_file_error(path, format!("{} is missing", key)))
    };

    let username = required(REQUIRED_KEYS[0])?;
    let password = required(REQUIRED_KEYS[1])?;
    let login_url = required(REQUIRED_KEYS[2])?;
    let get_capabilities_url = required(REQUIRED_KEYS[3])?;

    validate_url("LOGIN_URL", &login_url)
        .map_err(|e| credential_file_error(path, e.to_string()))?;
    validate_url("GET_CAPABILITIES_URL", &get_capabilities_url)
        .map_err(|e| credential_file_error(path, e.to_string()))?;

    let base_url = values
        .get("BASE_URL")
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    Ok(CredentialSet {
        group,
        environment,
        username,
        password,
        login_url,
        get_capabilities_url,
        base_url,
        ssl_verify: resolve_flag(values.get("SSL_VERIFY"), "SSL_VERIFY"),
        full_layer_details: resolve_flag(values.get("FULL_LAYER_DETAILS"), "FULL_LAYER_DETAILS"),
    })
}

/// 掃描憑證目錄。
///
/// 檔名不符合慣例 → warning 跳過；單一檔案格式錯誤 → 個別記錄，其餘照常。
/// 結果依 `(group, environment)` 排序。
pub fn scan_credentials(envs_dir: &Path) -> (Vec<CredentialSet>, Vec<(String, HarvestError)>) {
    let mut sets = Vec::new();
    let mut failures = Vec::new();

    if !envs_dir.is_dir() {
        return (sets, failures);
    }

    let mut entries: Vec<_> = match std::fs::read_dir(envs_dir) {
        Ok(dir) => dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect(),
        Err(e) => {
            failures.push((envs_dir.display().to_string(), HarvestError::Io(e)));
            return (sets, failures);
        }
    };
    entries.sort();

    for path in entries {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((group, environment)) = parse_credential_filename(file_name) else {
            tracing::warn!(
                "🔶 Skipping '{}': name does not match <group>.<environment>",
                file_name
            );
            continue;
        };

        match parse_credential_file(&path)
            .and_then(|values| build_credential_set(group, environment, &values, &path))
        {
            Ok(set) => sets.push(set),
            Err(e) => failures.push((path.display().to_string(), e)),
        }
    }

    sets.sort_by(|a, b| {
        (a.group.as_str(), a.environment.as_str()).cmp(&(b.group.as_str(), b.environment.as_str()))
    });
    (sets, failures)
}

/// 載入指定的憑證檔。
///
/// 檔名不符合慣例時退回：group = 上層目錄名、environment = 檔名主幹。
pub fn credential_from_path(path: &Path) -> Result<CredentialSet> {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    let (group, environment) = match parse_credential_filename(file_name) {
        Some(parsed) => parsed,
        None => {
            let group = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();
            let environment = path
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .trim_start_matches('.')
                .to_string();
            (group, environment)
        }
    };

    let values = parse_credential_file(path)?;
    build_credential_set(group, environment, &values, path)
}
