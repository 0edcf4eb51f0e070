//! 答案汇总与导出 - 业务能力层
//!
//! 把各部分的答案记录合并成一个版本的答案，并导出为 CSV / JSON。

use crate::error::{AppError, AppResult, ExportError};
use crate::models::answer::{AnswerRecord, VersionKey};

/// CSV 表头
pub const CSV_HEADER: [&str; 4] = ["Version", "Part", "Question", "Answer"];

/// 合并各部分的记录：按部分编号排序，同一部分内保持题号顺序
pub fn aggregate(per_part: Vec<Vec<AnswerRecord>>) -> Vec<AnswerRecord> {
    let mut records: Vec<AnswerRecord> = per_part.into_iter().flatten().collect();
    records.sort_by_key(|record| record.part);
    records
}

/// 单个版本的答案 CSV：`Version,Part,Question,Answer`
pub fn version_csv(key: &VersionKey) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for record in &key.records {
        let part = record.part.to_string();
        let number = record.question_number.to_string();
        let answer = record.display_answer();
        writer.write_record([key.label.as_str(), part.as_str(), number.as_str(), answer.as_str()])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        AppError::Export(ExportError::CsvFailed {
            source: Box::new(e),
        })
    })
}

/// 全部版本合并导出为 JSON
pub fn versions_json(keys: &[VersionKey]) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(keys)?)
}
