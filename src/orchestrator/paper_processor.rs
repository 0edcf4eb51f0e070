//! 单个版本处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责把原始试卷变成一个混排后的版本，是试卷级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **定位部分**：查找 PHẦN 1 / 2 / 3 标记
//! 2. **流程调度**：每个部分交给 `PartFlow`
//! 3. **重新拼装**：前言 + 各部分标记块 + 各部分输出
//! 4. **答案汇总**：按部分顺序合并答案记录
//! 5. **回写归档**：只替换 `word/document.xml`

use crate::config::EngineOptions;
use crate::error::ShuffleError;
use crate::infrastructure::DocxPackage;
use crate::models::answer::AnswerRecord;
use crate::models::block::Block;
use crate::models::mode::{ExamPart, ShuffleMode};
use crate::services::answer_key;
use crate::services::segmenter::find_part_boundary;
use crate::services::warn_writer::KeyWarning;
use crate::workflow::{PartCtx, PartFlow};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};

/// 混排后的块序列和答案
#[derive(Debug, Default)]
pub struct ShuffledBlocks {
    pub blocks: Vec<Block>,
    pub records: Vec<AnswerRecord>,
    pub warnings: Vec<KeyWarning>,
}

/// 一个版本的输出
#[derive(Debug, Clone)]
pub struct ShuffleOutput {
    /// 新的 .docx 字节
    pub document: Vec<u8>,
    pub records: Vec<AnswerRecord>,
    pub warnings: Vec<KeyWarning>,
}

/// 按模式混排一组块
///
/// - 平铺模式：整组块当作同一种题型的一个部分
/// - auto 模式：按 PHẦN 标记切分；一个标记都没有时返回 `NoPartFound`
pub fn shuffle_blocks<R: Rng + ?Sized>(
    blocks: Vec<Block>,
    mode: ShuffleMode,
    options: &EngineOptions,
    version: usize,
    rng: &mut R,
) -> Result<ShuffledBlocks, ShuffleError> {
    let flow = PartFlow::new(options);

    if let Some(part) = mode.flat_part() {
        let ctx = PartCtx::flat(version, part);
        let outcome = flow.run(&ctx, blocks, rng);
        return Ok(ShuffledBlocks {
            blocks: outcome.blocks,
            records: outcome.records,
            warnings: outcome.warnings,
        });
    }

    let mut markers: Vec<(usize, ExamPart)> = ExamPart::ALL
        .iter()
        .filter_map(|&part| find_part_boundary(&blocks, part).map(|index| (index, part)))
        .collect();
    markers.sort_by_key(|(index, _)| *index);
    // 同一个块里同时写了两个 PHẦN 时只认编号小的那个
    markers.dedup_by_key(|(index, _)| *index);

    if markers.is_empty() {
        return Err(ShuffleError::NoPartFound);
    }
    debug!("V{} 部分标记位置: {:?}", version, markers);

    // 前言 | (标记块, 部分内容) ...
    let mut preamble = Vec::new();
    let mut sections: Vec<(ExamPart, Block, Vec<Block>)> = Vec::with_capacity(markers.len());
    let mut pending = markers.iter().peekable();
    for (index, block) in blocks.into_iter().enumerate() {
        if let Some(&&(at, part)) = pending.peek() {
            if at == index {
                pending.next();
                sections.push((part, block, Vec::new()));
                continue;
            }
        }
        match sections.last_mut() {
            Some((_, _, body)) => body.push(block),
            None => preamble.push(block),
        }
    }

    let mut shuffled = ShuffledBlocks {
        blocks: preamble,
        ..Default::default()
    };
    let mut per_part = Vec::with_capacity(sections.len());

    for (part, marker, body) in sections {
        let ctx = PartCtx::new(version, part);
        let outcome = flow.run(&ctx, body, rng);
        shuffled.blocks.push(marker);
        shuffled.blocks.extend(outcome.blocks);
        shuffled.warnings.extend(outcome.warnings);
        per_part.push(outcome.records);
    }
    shuffled.records = answer_key::aggregate(per_part);

    Ok(shuffled)
}

/// 试卷混排器
///
/// 持有原始归档（只读、可在线程间共享），每次调用生成一个独立的版本。
#[derive(Debug, Clone)]
pub struct ExamShuffler {
    package: Arc<DocxPackage>,
    options: EngineOptions,
}

impl ExamShuffler {
    pub fn new(source: impl Into<Vec<u8>>, options: EngineOptions) -> Result<Self, ShuffleError> {
        let package = DocxPackage::load(source)?;
        // 提前解析一次，结构错误在这里就暴露
        package.load_block_tree()?;
        Ok(Self {
            package: Arc::new(package),
            options,
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// 生成一个版本
    pub fn shuffle_version<R: Rng + ?Sized>(
        &self,
        version: usize,
        mode: ShuffleMode,
        rng: &mut R,
    ) -> Result<ShuffleOutput, ShuffleError> {
        let mut tree = self.package.load_block_tree()?;
        let blocks = tree.take_blocks();
        let total_blocks = blocks.len();

        let shuffled = shuffle_blocks(blocks, mode, &self.options, version, rng)?;
        info!(
            "V{} 🔀 {} 模式: {} 个块 -> {} 个块，{} 条答案",
            version,
            mode,
            total_blocks,
            shuffled.blocks.len(),
            shuffled.records.len()
        );

        tree.set_blocks(shuffled.blocks);
        let document = self.package.save(tree)?;

        Ok(ShuffleOutput {
            document,
            records: shuffled.records,
            warnings: shuffled.warnings,
        })
    }
}

/// 便捷入口：用默认选项和线程随机数生成一个版本
pub fn shuffle(
    source: &[u8],
    mode: ShuffleMode,
) -> Result<(Vec<u8>, Vec<AnswerRecord>), ShuffleError> {
    let shuffler = ExamShuffler::new(source.to_vec(), EngineOptions::default())?;
    let output = shuffler.shuffle_version(1, mode, &mut rand::thread_rng())?;
    Ok((output.document, output.records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blocks_from, line, para, plain, texts, underlined};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn full_exam() -> Vec<Block> {
        blocks_from(
            &[
                line("SỞ GD&amp;ĐT - ĐỀ THI THỬ"),
                line("PHẦN 1. Trắc nghiệm nhiều lựa chọn"),
                line("Câu 1. Một"),
                para(&[plain("A. "), underlined("đúng")]),
                line("B. sai"),
                line("Câu 2. Hai"),
                line("A. sai"),
                para(&[plain("B. "), underlined("đúng")]),
                line("PHẦN 2. Đúng sai"),
                line("Câu 1. Xét"),
                para(&[plain("a) "), underlined("đúng")]),
                line("b) sai"),
                line("c) sai"),
                para(&[plain("d) "), underlined("đúng")]),
                line("PHẦN 3. Trả lời ngắn"),
                line("Câu 1. Tính"),
                line("Đáp án: x = 5"),
            ]
            .concat(),
        )
    }

    #[test]
    fn test_auto_mode_keeps_markers_and_orders_records() {
        let options = EngineOptions::default();
        let mut rng = StdRng::seed_from_u64(21);
        let shuffled = shuffle_blocks(full_exam(), ShuffleMode::Auto, &options, 1, &mut rng).unwrap();

        let all = texts(&shuffled.blocks);
        assert_eq!(all[0], "SỞ GD&ĐT - ĐỀ THI THỬ");
        assert_eq!(all[1], "PHẦN 1. Trắc nghiệm nhiều lựa chọn");
        let p2 = all.iter().position(|t| t.starts_with("PHẦN 2")).unwrap();
        let p3 = all.iter().position(|t| t.starts_with("PHẦN 3")).unwrap();
        assert_eq!(p2, 8);
        assert!(p3 > p2);
        assert!(!all.iter().any(|t| t.starts_with("Đáp án")));

        let parts: Vec<u8> = shuffled.records.iter().map(|r| r.part).collect();
        assert_eq!(parts, vec![1, 1, 2, 3]);
        assert_eq!(shuffled.records[2].answer.chars().last(), Some('Đ'));
        assert_eq!(shuffled.records[3].answer, "x = 5");
        assert!(shuffled.warnings.is_empty());
    }

    #[test]
    fn test_auto_mode_without_markers_fails() {
        let options = EngineOptions::default();
        let mut rng = StdRng::seed_from_u64(0);
        let blocks = blocks_from(&[line("Câu 1. x"), line("A. 1"), line("B. 2")].concat());
        let result = shuffle_blocks(blocks, ShuffleMode::Auto, &options, 1, &mut rng);
        assert!(matches!(result, Err(ShuffleError::NoPartFound)));
    }

    #[test]
    fn test_missing_part_one_keeps_preamble() {
        let options = EngineOptions::default();
        let mut rng = StdRng::seed_from_u64(2);
        let blocks = blocks_from(
            &[
                line("Tiêu đề"),
                line("PHẦN 3. Trả lời ngắn"),
                line("Câu 5. a"),
                line("Đáp án: 1"),
                line("Câu 6. b"),
                line("Đáp án: 2"),
            ]
            .concat(),
        );
        let shuffled = shuffle_blocks(blocks, ShuffleMode::Auto, &options, 1, &mut rng).unwrap();
        let all = texts(&shuffled.blocks);
        assert_eq!(all[..2], ["Tiêu đề", "PHẦN 3. Trả lời ngắn"]);
        assert_eq!(all.len(), 4);
        assert!(all[2].starts_with("Câu 1.") && all[3].starts_with("Câu 2."));
    }

    #[test]
    fn test_flat_mode_renumbers_everything() {
        let options = EngineOptions::default();
        let mut rng = StdRng::seed_from_u64(8);
        let blocks = blocks_from(
            &[
                line("Câu 4. x"),
                para(&[plain("A. "), underlined("1")]),
                line("B. 2"),
                line("Câu 9. y"),
                line("A. 1"),
                para(&[plain("B. "), underlined("2")]),
            ]
            .concat(),
        );
        let shuffled = shuffle_blocks(blocks, ShuffleMode::Mcq, &options, 1, &mut rng).unwrap();
        let headers: Vec<String> = texts(&shuffled.blocks)
            .into_iter()
            .filter(|t| t.starts_with("Câu"))
            .collect();
        assert!(headers[0].starts_with("Câu 1."));
        assert!(headers[1].starts_with("Câu 2."));
        assert_eq!(shuffled.records.len(), 2);
        assert!(shuffled.records.iter().all(|r| r.part == 1 && !r.answer.is_empty()));
    }

    #[test]
    fn test_flat_tf_mode_keeps_d_last() {
        let options = EngineOptions::default();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let blocks = blocks_from(
                &[
                    line("Câu 3. Xét"),
                    para(&[plain("a) "), underlined("một")]),
                    line("b) hai"),
                    line("c) ba"),
                    para(&[plain("d) "), underlined("bốn")]),
                    line("Câu 8. Xét tiếp"),
                    line("a) năm"),
                    para(&[plain("b) "), underlined("sáu")]),
                    line("c) bảy"),
                    line("d) tám"),
                ]
                .concat(),
            );
            let shuffled = shuffle_blocks(blocks, ShuffleMode::Tf, &options, 1, &mut rng).unwrap();
            let all = texts(&shuffled.blocks);

            assert!(all[0].starts_with("Câu 1."));
            assert!(all[5].starts_with("Câu 2."));
            assert!(all[4] == "d) bốn" || all[9] == "d) bốn");
            assert!(all[4] == "d) tám" || all[9] == "d) tám");

            assert_eq!(shuffled.records.len(), 2);
            assert!(shuffled.records.iter().all(|r| r.part == 2));
            let numbers: Vec<usize> = shuffled.records.iter().map(|r| r.question_number).collect();
            assert_eq!(numbers, vec![1, 2]);

            for record in &shuffled.records {
                let start = (record.question_number - 1) * 5;
                let d_is_true = all[start + 4] == "d) bốn";
                assert_eq!(record.answer.chars().nth(3), Some(if d_is_true { 'Đ' } else { 'S' }));
                let labels: Vec<char> =
                    all[start + 1..start + 5].iter().filter_map(|t| t.chars().next()).collect();
                assert_eq!(labels, vec!['a', 'b', 'c', 'd']);
            }
        }
    }
}
