use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 文档（docx 归档 / XML）相关错误
    Document(DocxError),
    /// 试卷结构错误
    Shuffle(ShuffleError),
    /// 文件操作错误
    File(FileError),
    /// 答案导出错误
    Export(ExportError),
    /// 配置错误
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Document(e) => write!(f, "文档错误: {}", e),
            AppError::Shuffle(e) => write!(f, "试卷结构错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Export(e) => write!(f, "导出错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Document(e) => Some(e),
            AppError::Shuffle(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Export(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

/// docx 归档与 XML 树错误
#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    #[error("ZIP 错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML 解析失败: {0}")]
    Xml(String),

    #[error("找不到文档结构: {what}")]
    StructureNotFound { what: String },
}

impl DocxError {
    /// 把任意 quick-xml 错误包装为 `DocxError::Xml`
    pub fn xml(err: impl fmt::Display) -> Self {
        DocxError::Xml(err.to_string())
    }

    pub fn structure_not_found(what: impl Into<String>) -> Self {
        DocxError::StructureNotFound { what: what.into() }
    }
}

/// 试卷混排错误
///
/// 只有真正无法继续的情况才是错误；选项不足、标签缺失等情况
/// 都按原样放行，只记录日志。
#[derive(Debug, thiserror::Error)]
pub enum ShuffleError {
    /// 归档缺少主文档或 `w:body`
    #[error("找不到文档结构: {0}")]
    StructureNotFound(String),

    /// auto 模式下没有找到任何 PHẦN 1/2/3 标记
    #[error("auto 模式下未找到 PHẦN 1 / PHẦN 2 / PHẦN 3 标记")]
    NoPartFound,

    #[error(transparent)]
    Document(DocxError),
}

impl From<DocxError> for ShuffleError {
    fn from(err: DocxError) -> Self {
        match err {
            DocxError::StructureNotFound { what } => ShuffleError::StructureNotFound(what),
            other => ShuffleError::Document(other),
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 答案导出错误
#[derive(Debug)]
pub enum ExportError {
    /// CSV 写入失败
    CsvFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 序列化失败
    JsonFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 打包 ZIP 失败
    BundleFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::CsvFailed { source } => write!(f, "CSV写入失败: {}", source),
            ExportError::JsonFailed { source } => write!(f, "JSON序列化失败: {}", source),
            ExportError::BundleFailed { source } => write!(f, "ZIP打包失败: {}", source),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::CsvFailed { source }
            | ExportError::JsonFailed { source }
            | ExportError::BundleFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 取值超出允许范围
    OutOfRange {
        field: String,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::OutOfRange { field, value } => {
                write!(f, "配置项 {} 的取值 '{}' 超出允许范围", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<DocxError> for AppError {
    fn from(err: DocxError) -> Self {
        AppError::Document(err)
    }
}

impl From<ShuffleError> for AppError {
    fn from(err: ShuffleError) -> Self {
        AppError::Shuffle(err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Export(ExportError::CsvFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Export(ExportError::JsonFailed {
            source: Box::new(err),
        })
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Export(ExportError::BundleFailed {
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建 TOML 解析错误（带路径）
    pub fn toml_parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
