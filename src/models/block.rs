//! 块模型
//!
//! 块是 `w:body` 下的一个顶层内容单元（段落或表格）。块只会被移动，
//! 不会被复制：身份随所有权一起走，正确答案按身份追踪。

use crate::error::DocxError;
use crate::infrastructure::xml_tree::{XmlDocument, XmlElement, XmlNode, W_NS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Table,
}

/// 一个顶层块（`w:p` 或 `w:tbl`）
#[derive(Debug, PartialEq)]
pub struct Block {
    element: XmlElement,
    kind: BlockKind,
}

impl Block {
    /// 包装一个 body 子元素；不是段落或表格时原样退回
    pub fn from_element(element: XmlElement) -> Result<Self, XmlElement> {
        let kind = if element.is(W_NS, "p") {
            BlockKind::Paragraph
        } else if element.is(W_NS, "tbl") {
            BlockKind::Table
        } else {
            return Err(element);
        };
        Ok(Self { element, kind })
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn element(&self) -> &XmlElement {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut XmlElement {
        &mut self.element
    }

    pub fn into_element(self) -> XmlElement {
        self.element
    }

    /// 所有可见文本按文档顺序拼接后去掉首尾空白，内部空白不做处理
    pub fn visible_text(&self) -> String {
        let text: String = self
            .element
            .descendants()
            .into_iter()
            .filter(|el| el.is(W_NS, "t"))
            .map(XmlElement::text)
            .collect();
        text.trim().to_string()
    }

    /// 块内所有 `w:r`（包括超链接、表格单元格里的）
    pub fn runs(&self) -> Vec<&XmlElement> {
        self.element
            .descendants()
            .into_iter()
            .filter(|el| el.is(W_NS, "r"))
            .collect()
    }

    /// 所有 `w:t` 的路径（相对于块元素）
    pub fn text_paths(&self) -> Vec<Vec<usize>> {
        self.element.descendant_paths(|el| el.is(W_NS, "t"))
    }

    /// 所有 `w:r` 的路径（相对于块元素）
    pub fn run_paths(&self) -> Vec<Vec<usize>> {
        self.element.descendant_paths(|el| el.is(W_NS, "r"))
    }
}

/// 主文档的块视图
///
/// 构建时把 `w:body` 的子节点整体取出：段落和表格成为 `blocks`，
/// 其余元素（`w:sectPr`、书签等）放进 `others`，回写时追加在所有块之后。
#[derive(Debug)]
pub struct BlockTree {
    document: XmlDocument,
    body_path: Vec<usize>,
    blocks: Vec<Block>,
    others: Vec<XmlNode>,
}

impl BlockTree {
    pub fn from_document(mut document: XmlDocument) -> Result<Self, DocxError> {
        let body_path = document
            .root
            .descendant_paths(|el| el.is(W_NS, "body"))
            .into_iter()
            .next()
            .ok_or_else(|| DocxError::structure_not_found("w:body"))?;

        let body = document
            .root
            .at_path_mut(&body_path)
            .ok_or_else(|| DocxError::structure_not_found("w:body"))?;

        let mut blocks = Vec::new();
        let mut others = Vec::new();
        for node in std::mem::take(&mut body.children) {
            match node {
                XmlNode::Element(element) => match Block::from_element(element) {
                    Ok(block) => blocks.push(block),
                    Err(element) => others.push(XmlNode::Element(element)),
                },
                node if node.is_blank_text() => {}
                node => others.push(node),
            }
        }

        Ok(Self {
            document,
            body_path,
            blocks,
            others,
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// 取出全部块，树中只剩非块节点
    pub fn take_blocks(&mut self) -> Vec<Block> {
        std::mem::take(&mut self.blocks)
    }

    pub fn set_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
    }

    /// 非块节点（保持原有相对顺序）
    pub fn others(&self) -> &[XmlNode] {
        &self.others
    }

    /// 重新组装 body：先是全部块，再是非块节点
    pub fn into_document(self) -> XmlDocument {
        let Self {
            mut document,
            body_path,
            blocks,
            others,
        } = self;

        if let Some(body) = document.root.at_path_mut(&body_path) {
            body.children = blocks
                .into_iter()
                .map(|block| XmlNode::Element(block.into_element()))
                .chain(others)
                .collect();
        }
        document
    }
}
