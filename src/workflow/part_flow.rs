//! 部分处理流程 - 流程层
//!
//! 核心职责：定义"一个部分"的完整处理流程
//!
//! 流程顺序：
//! 1. 分段（说明块 + 题组）
//! 2. 每道题：提取事实 → 混排选项 / 读取答案
//! 3. 混排题目顺序
//! 4. 按新位置改写题号和选项标签，生成答案记录

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::EngineOptions;
use crate::models::answer::{AnswerRecord, DerivedAnswer};
use crate::models::block::Block;
use crate::models::label::LabelKind;
use crate::models::mode::ExamPart;
use crate::models::question::{PartSegments, QuestionGroup};
use crate::services::inspector;
use crate::services::permutation::{
    extract_short_answer, fisher_yates, shuffle_mcq_options, shuffle_tf_options,
};
use crate::services::relabeler::{relabel_options, relabel_question};
use crate::services::segmenter::segment;
use crate::services::warn_writer::KeyWarning;
use crate::utils::logging::truncate_text;
use crate::workflow::part_ctx::PartCtx;

/// 一个部分处理后的结果
#[derive(Debug, Default)]
pub struct PartOutcome {
    /// 说明块在前、混排后的题组在后
    pub blocks: Vec<Block>,
    pub records: Vec<AnswerRecord>,
    pub warnings: Vec<KeyWarning>,
}

/// 部分处理流程
///
/// - 编排分段、混排、改写标签
/// - 不持有文档，只消费传入的块
/// - 只依赖业务能力（services）
pub struct PartFlow<'a> {
    options: &'a EngineOptions,
}

/// 该部分的选项标签种类
fn option_kind(part: ExamPart) -> Option<LabelKind> {
    match part {
        ExamPart::MultipleChoice => Some(LabelKind::McqOption),
        ExamPart::TrueFalse => Some(LabelKind::TfOption),
        ExamPart::ShortAnswer => None,
    }
}

impl<'a> PartFlow<'a> {
    pub fn new(options: &'a EngineOptions) -> Self {
        Self { options }
    }

    pub fn run<R: Rng + ?Sized>(
        &self,
        ctx: &PartCtx,
        blocks: Vec<Block>,
        rng: &mut R,
    ) -> PartOutcome {
        let PartSegments { intro, groups } = segment(blocks);

        if groups.is_empty() {
            warn!("{} ⚠️ 没有找到任何题号（Câu N），原样保留 {} 个块", ctx, intro.len());
            return PartOutcome {
                blocks: intro,
                ..Default::default()
            };
        }

        info!("{} 📝 {} 道题，{} 个说明块", ctx, groups.len(), intro.len());

        // 每道题先混排选项（或读取答案），答案跟着题组一起移动
        let mut questions: Vec<(QuestionGroup, DerivedAnswer)> = Vec::with_capacity(groups.len());
        for group in groups {
            questions.push(self.shuffle_group(ctx.part, group, rng));
        }
        fisher_yates(&mut questions, rng);

        let mut outcome = PartOutcome {
            blocks: intro,
            ..Default::default()
        };

        for (index, (mut group, answer)) in questions.into_iter().enumerate() {
            let number = index + 1;
            debug!(
                "{} Câu {} <- {}",
                ctx,
                number,
                truncate_text(&group.header().visible_text(), 40)
            );

            if !relabel_question(group.header_mut(), number, &self.options.label_style) {
                warn!(
                    "{} ⚠️ 题号未能改写: {}",
                    ctx,
                    truncate_text(&group.header().visible_text(), 40)
                );
            }
            if let Some(kind) = option_kind(ctx.part) {
                relabel_options(&mut group, kind, &self.options.label_style);
            }

            if let Some(reason) = answer.missing_reason() {
                debug!("{} Câu {} 答案不完整: {}", ctx, number, reason);
                outcome.warnings.push(KeyWarning::new(ctx.part, number, reason));
            }
            outcome
                .records
                .push(AnswerRecord::new(ctx.part, number, answer.to_answer_string()));
            outcome.blocks.extend(group.into_blocks());
        }

        outcome
    }

    fn shuffle_group<R: Rng + ?Sized>(
        &self,
        part: ExamPart,
        group: QuestionGroup,
        rng: &mut R,
    ) -> (QuestionGroup, DerivedAnswer) {
        let (mut group, answer) = match part {
            ExamPart::MultipleChoice => shuffle_mcq_options(group, rng),
            ExamPart::TrueFalse => shuffle_tf_options(group, rng),
            ExamPart::ShortAnswer => extract_short_answer(group, self.options.strip_answer_lines),
        };

        // 事实已经提取完毕，此时才可以去掉答案标记
        if self.options.clear_answer_marks {
            if let Some(kind) = option_kind(part) {
                for block in group.blocks_mut().iter_mut().skip(1) {
                    if kind.matches(&block.visible_text()) {
                        inspector::clear_underline(block);
                    }
                }
            }
        }

        (group, answer)
    }
}
