//! 批量版本处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责生成全部版本和输出文件。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、读取原始试卷、创建 `ExamShuffler`
//! 2. **并发控制**：使用 Semaphore 限制同时生成的版本数
//! 3. **退路处理**：auto 模式找不到 PHẦN 标记时按配置改用平铺模式
//! 4. **输出文件**：单版本直接写 docx + csv，多版本打包成一个 zip
//! 5. **全局统计**：汇总成功 / 失败数量和答案警告
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个版本的细节
//! - **资源所有者**：唯一持有原始归档的模块
//! - **并发安全**：每个版本在独立的阻塞任务里用自己的随机数生成器
//! - **向下委托**：委托 paper_processor 处理单个版本

use crate::config::Config;
use crate::error::ShuffleError;
use crate::models::answer::VersionKey;
use crate::models::mode::ShuffleMode;
use crate::orchestrator::paper_processor::{ExamShuffler, ShuffleOutput};
use crate::services::answer_key;
use crate::services::warn_writer::{KeyWarning, WarnWriter};
use crate::utils::logging;
use anyhow::{Context, Result};
use regex::Regex;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

static DOCX_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.docx$").expect("扩展名正则"));
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("文件名正则"));

/// 由输入文件名得到输出文件的前缀
///
/// 去掉 `.docx`，只保留字母数字、空白和 `-`；结果为空时用 `De`。
pub fn sanitize_base_name(input_path: &str) -> String {
    let file_name = Path::new(input_path)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = DOCX_SUFFIX.replace(&file_name, "");
    let cleaned = UNSAFE_CHARS.replace_all(&stem, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "De".to_string()
    } else {
        cleaned.to_string()
    }
}

/// 一个成功生成的版本
#[derive(Debug, Clone)]
pub struct GeneratedVersion {
    pub version: usize,
    /// 实际使用的模式（可能是退路模式）
    pub mode: ShuffleMode,
    pub document: Vec<u8>,
    pub key: VersionKey,
    pub warnings: Vec<KeyWarning>,
}

/// 一次运行的结果
#[derive(Debug, Default)]
pub struct RunSummary {
    /// 写出的文件
    pub outputs: Vec<PathBuf>,
    pub keys: Vec<VersionKey>,
    pub success: usize,
    pub failed: usize,
    pub warnings: usize,
}

/// 应用主结构
pub struct App {
    config: Config,
    shuffler: ExamShuffler,
    base_name: String,
    warn_writer: WarnWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;

        logging::log_startup(
            &config.input_path,
            config.num_versions,
            config.shuffle_mode.name(),
            config.max_concurrent_versions,
        );

        let source = tokio::fs::read(&config.input_path)
            .await
            .with_context(|| format!("无法读取原始试卷: {}", config.input_path))?;
        info!("✓ 已读取原始试卷 ({} 字节)", source.len());

        let shuffler = ExamShuffler::new(source, config.engine_options())
            .with_context(|| format!("不是有效的 docx: {}", config.input_path))?;

        Ok(Self {
            base_name: sanitize_base_name(&config.input_path),
            warn_writer: WarnWriter::with_path(config.warn_file.clone()),
            shuffler,
            config,
        })
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunSummary> {
        let generated = self.generate_versions().await?;
        let total = self.config.num_versions;

        let mut summary = RunSummary {
            success: generated.len(),
            failed: total - generated.len(),
            ..Default::default()
        };

        if generated.is_empty() {
            logging::print_final_stats(0, total, total, &self.config.output_log_file);
            anyhow::bail!("所有版本都生成失败");
        }

        for version in &generated {
            let label = &version.key.label;
            summary.warnings += self.warn_writer.write(label, &version.warnings).await?;
            logging::append_log_line(
                &self.config.output_log_file,
                &format!(
                    "{} | 模式 {} | {} 道题 | {} 条警告",
                    label,
                    version.mode,
                    version.key.records.len(),
                    version.warnings.len()
                ),
            )?;
        }
        if summary.warnings > 0 {
            warn!(
                "⚠️ 共 {} 道题答案不完整，详见 {}",
                summary.warnings,
                self.warn_writer.path()
            );
        }

        summary.outputs = self.write_outputs(&generated).await?;
        summary.keys = generated.into_iter().map(|version| version.key).collect();

        if self.config.export_json {
            let path = self.output_path(&format!("{}_DAPAN.json", self.base_name));
            tokio::fs::write(&path, answer_key::versions_json(&summary.keys)?).await?;
            info!("📝 JSON 答案已写入: {}", path.display());
            summary.outputs.push(path);
        }

        for path in &summary.outputs {
            logging::append_log_line(&self.config.output_log_file, &format!("输出: {}", path.display()))?;
        }
        logging::print_final_stats(
            summary.success,
            summary.failed,
            total,
            &self.config.output_log_file,
        );

        Ok(summary)
    }

    /// 并发生成全部版本，结果按版本号排序
    async fn generate_versions(&self) -> Result<Vec<GeneratedVersion>> {
        let total = self.config.num_versions;
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_versions));
        let mode = self.config.shuffle_mode;
        let fallback = self.config.fallback();

        let mut handles = Vec::with_capacity(total);
        for version in 1..=total {
            let permit = semaphore.clone().acquire_owned().await?;
            let shuffler = self.shuffler.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                logging::log_version_start(version, total);
                generate_one(&shuffler, version, mode, fallback)
            });
            handles.push(handle);
        }

        let mut generated = Vec::with_capacity(total);
        for (index, joined) in futures::future::join_all(handles).await.into_iter().enumerate() {
            let version = index + 1;
            match joined {
                Ok(Ok(output)) => {
                    logging::log_version_complete(
                        version,
                        output.key.records.len(),
                        output.warnings.len(),
                    );
                    generated.push(output);
                }
                Ok(Err(e)) => error!("[V{}] ❌ 生成失败: {}", version, e),
                Err(e) => error!("[V{}] 任务执行失败: {}", version, e),
            }
        }

        Ok(generated)
    }

    /// 写出文件：单版本直接写，多版本打包
    async fn write_outputs(&self, generated: &[GeneratedVersion]) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", self.config.output_dir))?;

        if self.config.num_versions == 1 {
            if let [single] = generated {
                let label = &single.key.label;
                let docx_path = self.output_path(&format!("{}_{}.docx", self.base_name, label));
                let csv_path = self.output_path(&format!("{}_{}_DAPAN.csv", self.base_name, label));
                tokio::fs::write(&docx_path, &single.document).await?;
                tokio::fs::write(&csv_path, answer_key::version_csv(&single.key)?).await?;
                info!("📄 已写入: {}", docx_path.display());
                return Ok(vec![docx_path, csv_path]);
            }
        }

        let bundle = bundle_versions(&self.base_name, generated)?;
        let zip_path = self.output_path(&format!("{}_multi.zip", self.base_name));
        tokio::fs::write(&zip_path, bundle).await?;
        info!("📦 已打包 {} 个版本: {}", generated.len(), zip_path.display());
        Ok(vec![zip_path])
    }

    fn output_path(&self, file_name: &str) -> PathBuf {
        Path::new(&self.config.output_dir).join(file_name)
    }
}

/// 生成一个版本；auto 模式找不到部分标记时改用退路模式
fn generate_one(
    shuffler: &ExamShuffler,
    version: usize,
    mode: ShuffleMode,
    fallback: Option<ShuffleMode>,
) -> Result<GeneratedVersion, ShuffleError> {
    let mut rng = rand::thread_rng();

    let (mode, output) = match shuffler.shuffle_version(version, mode, &mut rng) {
        Ok(output) => (mode, output),
        Err(ShuffleError::NoPartFound) => {
            let Some(fallback) = fallback else {
                return Err(ShuffleError::NoPartFound);
            };
            warn!(
                "[V{}] ⚠️ 没有找到 PHẦN 1/2/3 标记，改用 {} 模式",
                version, fallback
            );
            (fallback, shuffler.shuffle_version(version, fallback, &mut rng)?)
        }
        Err(e) => return Err(e),
    };

    let ShuffleOutput {
        document,
        records,
        warnings,
    } = output;

    Ok(GeneratedVersion {
        version,
        mode,
        document,
        key: VersionKey::new(version, records),
        warnings,
    })
}

/// 多版本打包：每个版本一个 docx 和一个答案 csv
pub fn bundle_versions(base_name: &str, generated: &[GeneratedVersion]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for version in generated {
        let label = &version.key.label;
        writer.start_file(format!("{}_{}.docx", base_name, label), options)?;
        writer.write_all(&version.document)?;
        writer.start_file(format!("{}_{}_DAPAN.csv", base_name, label), options)?;
        writer.write_all(answer_key::version_csv(&version.key)?.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}
