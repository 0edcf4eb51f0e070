use crate::error::{AppError, AppResult, ConfigError};
use crate::models::mode::ShuffleMode;
use crate::services::relabeler::LabelStyle;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// 默认的配置文件名（存在时才读取）
pub const DEFAULT_CONFIG_FILE: &str = "exam_shuffle.toml";
/// 版本数的上限
pub const MAX_VERSIONS: usize = 20;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 原始试卷路径
    pub input_path: String,
    /// 输出目录
    pub output_dir: String,
    /// 生成的版本数（1..=20）
    pub num_versions: usize,
    /// 混排模式
    pub shuffle_mode: ShuffleMode,
    /// 同时生成的版本数量
    pub max_concurrent_versions: usize,
    /// 改写后的标签是否加粗着色
    pub highlight_labels: bool,
    /// 标签颜色（十六进制 RRGGBB）
    pub label_color: String,
    /// 是否从试卷中删除简答题的答案行
    pub strip_answer_lines: bool,
    /// 是否去掉选项上的下划线（答案标记）
    pub clear_answer_marks: bool,
    /// 是否额外导出 JSON 答案
    pub export_json: bool,
    /// auto 模式找不到 PHẦN 标记时的退路：mcq / tf / none
    pub fallback_mode: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 答案缺失警告文件
    pub warn_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: "de_goc.docx".to_string(),
            output_dir: "output".to_string(),
            num_versions: 4,
            shuffle_mode: ShuffleMode::Auto,
            max_concurrent_versions: 4,
            highlight_labels: true,
            label_color: "0000FF".to_string(),
            strip_answer_lines: true,
            clear_answer_marks: false,
            export_json: false,
            fallback_mode: "mcq".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            warn_file: "warn.txt".to_string(),
        }
    }
}

/// 混排引擎的开关，和 IO 无关
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    pub label_style: LabelStyle,
    pub strip_answer_lines: bool,
    pub clear_answer_marks: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            label_style: LabelStyle::default(),
            strip_answer_lines: true,
            clear_answer_marks: false,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// 默认值 → 配置文件（CONFIG_FILE 或 exam_shuffle.toml）→ 环境变量
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            debug!("读取配置文件: {}", path);
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };
        base.with_env().normalized()
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| AppError::file_read_failed(path, e))?;
        toml::from_str(&content).map_err(|e| AppError::toml_parse_failed(path, e))
    }

    /// 用环境变量覆盖已有的值
    pub fn with_env(self) -> Self {
        Self {
            input_path: std::env::var("EXAM_INPUT").unwrap_or(self.input_path),
            output_dir: std::env::var("EXAM_OUTPUT_DIR").unwrap_or(self.output_dir),
            num_versions: env_parse("NUM_VERSIONS").unwrap_or(self.num_versions),
            shuffle_mode: std::env::var("SHUFFLE_MODE")
                .ok()
                .and_then(|v| ShuffleMode::from_str(&v))
                .unwrap_or(self.shuffle_mode),
            max_concurrent_versions: env_parse("MAX_CONCURRENT_VERSIONS")
                .unwrap_or(self.max_concurrent_versions),
            highlight_labels: env_parse("HIGHLIGHT_LABELS").unwrap_or(self.highlight_labels),
            label_color: std::env::var("LABEL_COLOR").unwrap_or(self.label_color),
            strip_answer_lines: env_parse("STRIP_ANSWER_LINES").unwrap_or(self.strip_answer_lines),
            clear_answer_marks: env_parse("CLEAR_ANSWER_MARKS").unwrap_or(self.clear_answer_marks),
            export_json: env_parse("EXPORT_JSON").unwrap_or(self.export_json),
            fallback_mode: std::env::var("FALLBACK_MODE").unwrap_or(self.fallback_mode),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            warn_file: std::env::var("WARN_FILE").unwrap_or(self.warn_file),
        }
    }

    /// 命令行参数：第 1 个是输入文件，第 2 个是版本数
    pub fn with_args<I>(mut self, args: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        if let Some(input) = args.next() {
            self.input_path = input;
        }
        if let Some(count) = args.next() {
            self.num_versions = count.trim().parse().map_err(|_| {
                AppError::Config(ConfigError::EnvVarParseFailed {
                    var_name: "argv[2]".to_string(),
                    value: count.clone(),
                    expected_type: "usize".to_string(),
                })
            })?;
        }
        self.normalized()
    }

    /// 校验并收敛取值：版本数夹到 1..=20，颜色必须是 6 位十六进制
    pub fn normalized(mut self) -> AppResult<Self> {
        let clamped = self.num_versions.clamp(1, MAX_VERSIONS);
        if clamped != self.num_versions {
            warn!("⚠️ 版本数 {} 超出范围，已调整为 {}", self.num_versions, clamped);
            self.num_versions = clamped;
        }
        self.max_concurrent_versions = self.max_concurrent_versions.max(1);

        let color = self.label_color.trim().trim_start_matches('#').to_ascii_uppercase();
        if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::Config(ConfigError::OutOfRange {
                field: "label_color".to_string(),
                value: self.label_color,
            }));
        }
        self.label_color = color;

        if !matches!(self.fallback_mode.trim().to_ascii_lowercase().as_str(), "none" | "off")
            && ShuffleMode::from_str(&self.fallback_mode).is_none()
        {
            return Err(AppError::Config(ConfigError::OutOfRange {
                field: "fallback_mode".to_string(),
                value: self.fallback_mode,
            }));
        }
        Ok(self)
    }

    /// auto 模式失败后的退路；`none` 表示不退
    pub fn fallback(&self) -> Option<ShuffleMode> {
        ShuffleMode::from_str(&self.fallback_mode).filter(|mode| *mode != ShuffleMode::Auto)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            label_style: LabelStyle {
                highlight: self.highlight_labels,
                color: self.label_color.clone(),
            },
            strip_answer_lines: self.strip_answer_lines,
            clear_answer_marks: self.clear_answer_marks,
        }
    }
}
