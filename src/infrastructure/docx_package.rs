//! docx 归档 - 基础设施层
//!
//! 只负责"取出主文档的块树"和"把块树放回归档"两种能力。
//! 主文档之外的条目（图片、公式对象、样式等）按原始压缩数据逐字节复制。

use crate::error::DocxError;
use crate::infrastructure::xml_tree::XmlDocument;
use crate::models::block::BlockTree;
use std::io::{Cursor, Read, Write};
use tracing::debug;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// 主文档在归档中的路径
pub const DOCUMENT_PART: &str = "word/document.xml";

/// 已加载的 docx 包
///
/// 持有原始字节和主文档 XML 文本；每次 `load_block_tree` 都重新解析，
/// 因此每个版本拿到的都是互不相干的一棵树。
#[derive(Debug, Clone)]
pub struct DocxPackage {
    source: Vec<u8>,
    document_xml: String,
}

impl DocxPackage {
    pub fn load(bytes: impl Into<Vec<u8>>) -> Result<Self, DocxError> {
        let source = bytes.into();

        let document_xml = {
            let mut archive = ZipArchive::new(Cursor::new(source.as_slice()))?;
            let mut entry = match archive.by_name(DOCUMENT_PART) {
                Ok(entry) => entry,
                Err(ZipError::FileNotFound) => {
                    return Err(DocxError::structure_not_found(DOCUMENT_PART))
                }
                Err(e) => return Err(e.into()),
            };
            let mut buffer = Vec::new();
            entry.read_to_end(&mut buffer)?;
            decode_utf8(buffer)?
        };

        debug!("已读取 {} ({} 字节)", DOCUMENT_PART, document_xml.len());

        Ok(Self {
            source,
            document_xml,
        })
    }

    /// 解析出一棵新的块树
    pub fn load_block_tree(&self) -> Result<BlockTree, DocxError> {
        let document = XmlDocument::parse(&self.document_xml)?;
        BlockTree::from_document(document)
    }

    /// 用块树替换主文档，其余条目原样复制，返回新的归档字节
    pub fn save(&self, tree: BlockTree) -> Result<Vec<u8>, DocxError> {
        let xml = tree.into_document().to_xml_string();

        let mut archive = ZipArchive::new(Cursor::new(self.source.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            if entry.name() == DOCUMENT_PART {
                drop(entry);
                writer.start_file(DOCUMENT_PART, options)?;
                writer.write_all(xml.as_bytes())?;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    }

    /// 归档中的全部条目名
    pub fn entry_names(&self) -> Result<Vec<String>, DocxError> {
        let archive = ZipArchive::new(Cursor::new(self.source.as_slice()))?;
        Ok(archive.file_names().map(str::to_string).collect())
    }
}

fn decode_utf8(buffer: Vec<u8>) -> Result<String, DocxError> {
    let buffer = if buffer.starts_with(&[0xEF, 0xBB, 0xBF]) {
        buffer[3..].to_vec()
    } else {
        buffer
    };
    String::from_utf8(buffer).map_err(DocxError::xml)
}
