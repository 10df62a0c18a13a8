//! api-diff-core - C API 表面结构化差异分析核心库
//!
//! 这是一个基于 Tree-sitter 的 C 语言 API 表面分析核心库，
//! 将公共声明表面提取为规范化的有序树，并对两棵树做结构化比较。

pub mod context;
pub mod diff;
pub mod error;
pub mod formatter;
pub mod node;
pub mod normalizer;
pub mod parser;
pub mod performance;
pub mod scope;
pub mod token;

// 重新导出主要的公共 API
pub use context::NormalizedContext;
pub use diff::{DiffEngine, DiffEntry, FieldValue};
pub use error::{ApiDiffError, Result};
pub use formatter::{ApiDiffReport, ReportMetadata};
pub use node::{ApiNode, ConstQualifier, NodeKind, StorageClass, VirtualQualifier};
pub use normalizer::Normalizer;
// 导出多语言前端架构
pub use parser::{CFrontend, FrontendFactory, LanguageFrontend, RawDeclaration, SupportedLanguage};
// 导出性能组件
pub use performance::{PerformanceMonitor, SnapshotProcessor, SnapshotResult, SnapshotStats};
pub use scope::ScopeTracker;
