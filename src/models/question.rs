use crate::models::block::Block;

/// 题组：题号块 + 后续的题干 / 选项 / 其它块
///
/// 第一个块总是匹配 `Câu N` 的题号块。
#[derive(Debug, PartialEq)]
pub struct QuestionGroup {
    blocks: Vec<Block>,
}

impl QuestionGroup {
    pub fn new(header: Block) -> Self {
        Self {
            blocks: vec![header],
        }
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn header(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn header_mut(&mut self) -> &mut Block {
        &mut self.blocks[0]
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// 拆出全部块以便重排；调用方必须用 `from_blocks` 放回
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// 由重排后的块重新组成题组，第一个块仍须是题号块
    pub(crate) fn from_blocks(blocks: Vec<Block>) -> Self {
        debug_assert!(!blocks.is_empty());
        Self { blocks }
    }
}

/// 某一部分的分段结果
#[derive(Debug, Default)]
pub struct PartSegments {
    /// 第一道题之前的说明性块，原样保留、不参与混排
    pub intro: Vec<Block>,
    pub groups: Vec<QuestionGroup>,
}
