use crate::domain::model::{CredentialSet, GroupReport};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// `*.json` file names directly inside `path`, sorted. Missing dir → empty.
    fn list_json_files(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    /// Direct subdirectory names of `path`, sorted. Missing dir → empty.
    fn list_subdirs(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

/// 抓取 capabilities 文件的網路邊界；測試以 stub 替換
#[async_trait]
pub trait CapabilitySource: Send + Sync {
    async fn fetch(&self, credentials: &CredentialSet) -> Result<serde_json::Value>;
}

/// Accepts finished row tables plus highlight instructions; returns the
/// written path.
pub trait ReportSink: Send + Sync {
    fn write_report(
        &self,
        report: &GroupReport,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}
