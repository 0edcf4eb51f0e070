//! 警告写入服务 - 业务能力层
//!
//! 只负责"写 warn.txt"能力，不关心流程

use crate::models::mode::ExamPart;
use anyhow::Result;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// 一道题的答案缺失警告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyWarning {
    pub part: ExamPart,
    /// 混排后的题号
    pub question_number: usize,
    pub reason: String,
}

impl KeyWarning {
    pub fn new(part: ExamPart, question_number: usize, reason: impl Into<String>) -> Self {
        Self {
            part,
            question_number,
            reason: reason.into(),
        }
    }
}

/// 警告写入服务
///
/// 职责：
/// - 将答案不完整的题目写入 warn.txt
/// - 每个版本追加一批
/// - 不关心流程顺序
pub struct WarnWriter {
    warn_file_path: String,
}

impl WarnWriter {
    /// 创建新的警告写入服务
    pub fn new() -> Self {
        Self {
            warn_file_path: "warn.txt".to_string(),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warn_file_path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.warn_file_path
    }

    /// 单条警告的文本格式
    pub fn format_line(version_label: &str, warning: &KeyWarning) -> String {
        format!(
            "Mã đề {} | Phần {} | Câu {} | {}\n",
            version_label,
            warning.part.number(),
            warning.question_number,
            warning.reason
        )
    }

    /// 追加一个版本的全部警告，返回写入条数
    pub async fn write(&self, version_label: &str, warnings: &[KeyWarning]) -> Result<usize> {
        if warnings.is_empty() {
            return Ok(0);
        }

        debug!(
            "写入警告: 版本 {} | {} 条 -> {}",
            version_label,
            warnings.len(),
            self.warn_file_path
        );

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.warn_file_path)
            .await?;

        let content: String = warnings
            .iter()
            .map(|warning| Self::format_line(version_label, warning))
            .collect();
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(warnings.len())
    }
}

impl Default for WarnWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        let warning = KeyWarning::new(ExamPart::ShortAnswer, 4, "không có dòng \"Đáp án:\"");
        assert_eq!(
            WarnWriter::format_line("V2", &warning),
            "Mã đề V2 | Phần 3 | Câu 4 | không có dòng \"Đáp án:\"\n"
        );
    }

    #[tokio::test]
    async fn test_write_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warn.txt");
        let writer = WarnWriter::with_path(path.to_string_lossy().to_string());

        let warnings = vec![
            KeyWarning::new(ExamPart::MultipleChoice, 1, "a"),
            KeyWarning::new(ExamPart::TrueFalse, 2, "b"),
        ];
        assert_eq!(writer.write("V1", &warnings).await.unwrap(), 2);
        assert_eq!(writer.write("V2", &[]).await.unwrap(), 0);
        assert_eq!(writer.write("V2", &warnings[..1]).await.unwrap(), 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.lines().last().unwrap().starts_with("Mã đề V2 | Phần 1"));
    }
}
