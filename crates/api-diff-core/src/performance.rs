//! 性能模块
//!
//! 提供快照目录的收集与并发规范化处理：用 rayon 并行解析
//! 各编译单元，再按路径顺序确定性地合并为一个规范化上下文

use crate::context::NormalizedContext;
use crate::error::{ApiDiffError, Result};
use crate::normalizer::Normalizer;
use crate::parser::FrontendFactory;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// 快照处理器
///
/// 递归收集一个目录下的 C 源文件与头文件并并发规范化
pub struct SnapshotProcessor {
    /// 线程池大小
    thread_pool_size: usize,
    /// 是否跟随符号链接
    follow_links: bool,
}

/// 快照处理结果
#[derive(Debug)]
pub struct SnapshotResult {
    /// 合并后的规范化上下文
    pub context: NormalizedContext,
    /// 处理失败的编译单元及错误信息
    pub failed: Vec<(PathBuf, ApiDiffError)>,
    /// 性能统计
    pub stats: SnapshotStats,
}

/// 快照处理统计信息
#[derive(Debug, Clone)]
pub struct SnapshotStats {
    /// 总处理时间
    pub total_duration: Duration,
    /// 处理的编译单元数量
    pub units_processed: u64,
    /// 成功处理的编译单元数量
    pub successful_units: u64,
    /// 失败的编译单元数量
    pub failed_units: u64,
    /// 平均每个编译单元的处理时间
    pub avg_unit_processing_time: Duration,
}

/// 性能监控器
///
/// 工作线程通过共享引用并发计数，所有字段都是原子的
pub struct PerformanceMonitor {
    start_time: Instant,
    units_processed: AtomicU64,
    total_processing_nanos: AtomicU64,
    error_count: AtomicU64,
}

impl Default for SnapshotProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotProcessor {
    /// 创建新的快照处理器
    pub fn new() -> Self {
        Self {
            thread_pool_size: num_cpus::get(),
            follow_links: false,
        }
    }

    /// 设置线程池大小
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = size.max(1);
        self
    }

    /// 设置是否跟随符号链接
    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// 收集快照目录下的所有受支持源文件，按路径排序
    pub fn collect_source_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if root.is_file() {
            return match FrontendFactory::detect_language(root) {
                Some(_) => Ok(vec![root.to_path_buf()]),
                None => Err(ApiDiffError::UnsupportedFileType(
                    root.to_string_lossy().to_string(),
                )),
            };
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(self.follow_links) {
            let entry = entry.map_err(|e| {
                ApiDiffError::IoError(std::io::Error::other(format!(
                    "Failed to walk directory {}: {}",
                    root.display(),
                    e
                )))
            })?;
            if entry.file_type().is_file()
                && FrontendFactory::detect_language(entry.path()).is_some()
            {
                files.push(entry.path().to_path_buf());
            }
        }
        // 合并顺序取决于文件顺序，必须与遍历顺序无关
        files.sort();
        debug!("Collected {} source files under {}", files.len(), root.display());
        Ok(files)
    }

    /// 处理一个快照目录，返回合并后的规范化上下文
    pub fn process_snapshot(&self, root: &Path) -> Result<SnapshotResult> {
        let files = self.collect_source_files(root)?;
        let monitor = PerformanceMonitor::new();

        info!("开始并发处理 {} 个编译单元", files.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.thread_pool_size)
            .build()
            .map_err(|e| {
                ApiDiffError::ParseError(format!("Failed to create thread pool: {e}"))
            })?;

        let results: Vec<_> = pool.install(|| {
            files
                .par_iter()
                .map(|path| self.process_single_unit(path, &monitor))
                .collect()
        });

        // par_iter 的 collect 保持输入顺序，合并按路径顺序进行
        let mut context = NormalizedContext::new();
        let mut failed = Vec::new();
        for result in results {
            match result {
                Ok(unit_context) => context.merge(unit_context),
                Err((path, error)) => failed.push((path, error)),
            }
        }

        let stats = monitor.get_stats();
        info!(
            "快照处理完成: 成功 {}, 失败 {}, 总耗时 {:?}",
            stats.successful_units, stats.failed_units, stats.total_duration
        );

        Ok(SnapshotResult {
            context,
            failed,
            stats,
        })
    }

    /// 处理单个编译单元，失败时降级为记录并跳过
    fn process_single_unit(
        &self,
        path: &Path,
        monitor: &PerformanceMonitor,
    ) -> std::result::Result<NormalizedContext, (PathBuf, ApiDiffError)> {
        let start_time = Instant::now();
        let result = self.normalize_unit(path);
        let processing_time = start_time.elapsed();
        monitor.record_unit_processed(processing_time);

        match result {
            Ok(context) => {
                debug!("成功处理编译单元: {:?}, 耗时: {:?}", path, processing_time);
                Ok(context)
            }
            Err(error) => {
                warn!("处理编译单元失败: {:?}, 错误: {}", path, error);
                monitor.record_error();
                Err((path.to_path_buf(), error))
            }
        }
    }

    fn normalize_unit(&self, path: &Path) -> Result<NormalizedContext> {
        let mut frontend = FrontendFactory::create_frontend_for_file(path)?;
        let source = std::fs::read_to_string(path).map_err(|e| {
            ApiDiffError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read file {}: {}", path.display(), e),
            ))
        })?;
        let declarations = frontend.extract_declarations(&source)?;
        Ok(Normalizer::new().normalize_unit(&declarations))
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    /// 创建新的性能监控器
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            units_processed: AtomicU64::new(0),
            total_processing_nanos: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
        }
    }

    /// 记录一个编译单元处理完成
    pub fn record_unit_processed(&self, processing_time: Duration) {
        self.units_processed.fetch_add(1, Ordering::Relaxed);
        self.total_processing_nanos
            .fetch_add(processing_time.as_nanos() as u64, Ordering::Relaxed);
    }

    /// 记录错误
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取性能统计信息
    pub fn get_stats(&self) -> SnapshotStats {
        let total_duration = self.start_time.elapsed();
        let units_processed = self.units_processed.load(Ordering::Relaxed);
        let error_count = self.error_count.load(Ordering::Relaxed);

        let avg_unit_processing_time = if units_processed > 0 {
            let total_nanos = self.total_processing_nanos.load(Ordering::Relaxed);
            Duration::from_nanos(total_nanos / units_processed)
        } else {
            Duration::ZERO
        };

        SnapshotStats {
            total_duration,
            units_processed,
            successful_units: units_processed - error_count,
            failed_units: error_count,
            avg_unit_processing_time,
        }
    }
}
