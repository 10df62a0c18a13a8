//! api-diff - C API 表面结构化差异分析工具
//!
//! 这是一个基于 Tree-sitter 的 C 语言 API 分析工具，
//! 比较两个快照的公共声明表面并输出结构化差异报告。

mod cli;

use api_diff_core::{ApiDiffReport, DiffEngine, Result, SnapshotProcessor, SnapshotResult};
use cli::{Cli, Config};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    // 解析命令行参数
    let cli = Cli::parse_args();

    // 初始化日志记录，详细模式下提升默认级别
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // 验证参数
    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(2);
    }

    let config: Config = cli.into();

    if config.verbose {
        info!("Starting api-diff analysis");
        debug!(
            "Configuration: baseline={}, candidate={}",
            config.baseline.display(),
            config.candidate.display()
        );
    }

    // 运行主要逻辑
    match run(&config) {
        Ok(has_changes) => {
            info!("Analysis completed successfully");
            if has_changes && config.fail_on_changes {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Application error: {}", e);
            std::process::exit(2);
        }
    }
}

/// 主要应用逻辑：处理两个快照、比较、输出报告
fn run(config: &Config) -> Result<bool> {
    let processor = build_processor(config);

    // 两个快照相互独立，并行处理
    let (baseline_result, candidate_result) = rayon::join(
        || processor.process_snapshot(&config.baseline),
        || processor.process_snapshot(&config.candidate),
    );
    let baseline = report_failed_units(baseline_result?);
    let candidate = report_failed_units(candidate_result?);

    let changes = DiffEngine::new(&baseline, &candidate).diff();
    let report = ApiDiffReport::new(
        config.baseline.display().to_string(),
        config.candidate.display().to_string(),
        changes,
    );
    let has_changes = report.has_changes();

    match &config.output_file {
        Some(path) => {
            report.save_to_file(path, config.pretty)?;
            info!("Report written to {}", path.display());
        }
        None => {
            let content = if config.pretty {
                report.to_json_pretty()?
            } else {
                report.to_json()?
            };
            println!("{content}");
        }
    }

    Ok(has_changes)
}

fn build_processor(config: &Config) -> SnapshotProcessor {
    let mut processor = SnapshotProcessor::new().with_follow_links(config.follow_links);
    if let Some(threads) = config.threads {
        processor = processor.with_thread_pool_size(threads);
    }
    processor
}

/// 记录失败的编译单元，返回合并后的上下文
fn report_failed_units(result: SnapshotResult) -> api_diff_core::NormalizedContext {
    for (path, error) in &result.failed {
        warn!("Skipped unit {}: {}", path.display(), error);
    }
    debug!(
        "Processed {} units in {:?}",
        result.stats.units_processed, result.stats.total_duration
    );
    result.context
}
