//! 报告格式化模块
//!
//! 将差异条目包装为带元数据的报告信封，并序列化为 JSON

use crate::diff::DiffEntry;
use crate::error::Result;
use serde::Serialize;

/// 差异报告
#[derive(Debug, Serialize)]
pub struct ApiDiffReport {
    /// 报告元数据
    pub metadata: ReportMetadata,
    /// 差异条目，按确定性顺序排列
    pub changes: Vec<DiffEntry>,
}

/// 报告元数据
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// 工具版本
    #[serde(rename = "toolVersion")]
    pub tool_version: String,
    /// 生成时间戳
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    /// 基线快照标签
    pub baseline: String,
    /// 候选快照标签
    pub candidate: String,
    /// 差异条目数
    #[serde(rename = "changeCount")]
    pub change_count: usize,
}

impl ApiDiffReport {
    /// 用两个快照标签和差异条目构建报告
    pub fn new(
        baseline: impl Into<String>,
        candidate: impl Into<String>,
        changes: Vec<DiffEntry>,
    ) -> Self {
        let metadata = ReportMetadata {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            baseline: baseline.into(),
            candidate: candidate.into(),
            change_count: changes.len(),
        };
        Self { metadata, changes }
    }

    /// 是否存在差异
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// 序列化为紧凑 JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 序列化为带缩进的 JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 保存到文件
    pub fn save_to_file(&self, path: &std::path::Path, pretty: bool) -> Result<()> {
        let content = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        std::fs::write(path, content).map_err(crate::error::ApiDiffError::IoError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ApiNode, NodeKind};

    fn sample_entry() -> DiffEntry {
        let node = ApiNode::new(NodeKind::Function, "foo");
        DiffEntry::metadata("added", &node)
    }

    #[test]
    fn test_empty_report() {
        let report = ApiDiffReport::new("v1", "v2", Vec::new());
        assert!(!report.has_changes());
        assert_eq!(report.metadata.change_count, 0);
        assert_eq!(report.metadata.baseline, "v1");
        assert_eq!(report.metadata.candidate, "v2");
    }

    #[test]
    fn test_report_serialization_shape() {
        let report = ApiDiffReport::new("base", "head", vec![sample_entry()]);
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["metadata"]["baseline"], "base");
        assert_eq!(json["metadata"]["candidate"], "head");
        assert_eq!(json["metadata"]["changeCount"], 1);
        assert!(json["metadata"]["generatedAt"].is_string());
        assert_eq!(json["changes"][0]["tag"], "added");
        assert_eq!(json["changes"][0]["qualifiedName"], "foo");
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = ApiDiffReport::new("a", "b", vec![sample_entry()]);
        report.save_to_file(&path, true).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"changeCount\": 1"));
    }
}
