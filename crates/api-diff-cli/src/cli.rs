//! 命令行接口模块
//!
//! 提供命令行参数解析和用户交互功能

use api_diff_core::{ApiDiffError, Result};
use std::path::PathBuf;

use clap::Parser;

/// api-diff - C API 表面结构化差异分析工具
///
/// 这是一个基于 Tree-sitter 的 C 语言 API 分析工具，
/// 比较两个快照的公共声明表面并输出结构化差异报告。
#[derive(Parser, Debug)]
#[command(name = "api-diff")]
#[command(author = "api-diff contributors")]
#[command(version = "0.1.0")]
#[command(about = "A structural diff tool for C API surfaces")]
#[command(
    long_about = "api-diff extracts the public declaration surface of two C source snapshots into canonical ordered trees and reports added, removed, modified and re-ordered declarations as JSON."
)]
pub struct Cli {
    /// 基线快照路径（目录或单个源文件）
    #[arg(
        help = "Baseline snapshot: a directory or a single C source/header file",
        value_name = "BASELINE"
    )]
    pub baseline: PathBuf,

    /// 候选快照路径（目录或单个源文件）
    #[arg(
        help = "Candidate snapshot: a directory or a single C source/header file",
        value_name = "CANDIDATE"
    )]
    pub candidate: PathBuf,

    /// 输出到文件
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "Write the JSON report to a file instead of stdout"
    )]
    pub output_file: Option<PathBuf>,

    /// 带缩进的 JSON 输出
    #[arg(long = "pretty", help = "Pretty-print the JSON report")]
    pub pretty: bool,

    /// 有差异时以非零状态码退出
    #[arg(
        long = "fail-on-changes",
        help = "Exit with status 1 when the surfaces differ"
    )]
    pub fail_on_changes: bool,

    /// 线程数
    #[arg(
        long = "threads",
        value_name = "N",
        help = "Number of worker threads (defaults to the number of logical CPUs)",
        value_parser = clap::value_parser!(u32).range(1..=512)
    )]
    pub threads: Option<u32>,

    /// 遍历快照目录时跟随符号链接
    #[arg(
        long = "follow-links",
        help = "Follow symbolic links when collecting snapshot files"
    )]
    pub follow_links: bool,

    /// 详细输出
    #[arg(short = 'v', long = "verbose", help = "Enable verbose logging output")]
    pub verbose: bool,
}

/// 应用程序配置信息
#[derive(Debug, Clone)]
pub struct Config {
    /// 基线快照路径
    pub baseline: PathBuf,
    /// 候选快照路径
    pub candidate: PathBuf,
    /// 输出文件路径
    pub output_file: Option<PathBuf>,
    /// 是否带缩进输出
    pub pretty: bool,
    /// 有差异时是否以非零状态码退出
    pub fail_on_changes: bool,
    /// 线程数
    pub threads: Option<usize>,
    /// 是否跟随符号链接
    pub follow_links: bool,
    /// 是否启用详细输出
    pub verbose: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            baseline: cli.baseline,
            candidate: cli.candidate,
            output_file: cli.output_file,
            pretty: cli.pretty,
            fail_on_changes: cli.fail_on_changes,
            threads: cli.threads.map(|n| n as usize),
            follow_links: cli.follow_links,
            verbose: cli.verbose,
        }
    }
}

impl Cli {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// 验证参数的有效性
    pub fn validate(&self) -> Result<()> {
        if !self.baseline.exists() {
            return Err(ApiDiffError::ConfigError(format!(
                "Baseline path does not exist: {}",
                self.baseline.display()
            )));
        }
        if !self.candidate.exists() {
            return Err(ApiDiffError::ConfigError(format!(
                "Candidate path does not exist: {}",
                self.candidate.display()
            )));
        }

        // 验证并创建输出文件路径 (如果指定)
        if let Some(output_file) = &self.output_file
            && let Some(parent) = output_file.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ApiDiffError::IoError(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create output directory {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        Ok(())
    }
}
