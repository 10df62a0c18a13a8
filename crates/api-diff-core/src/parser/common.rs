//! 通用前端接口和原始声明事件模型
//!
//! 前端以同步、源码顺序的事件流交付原始声明，每个事件只暴露事实：
//! 是否属于主编译单元、声明类别、可选名称、可能不完整或无效的
//! 底层类型，以及类别特有的访问器。所有规则判断都属于规范化器

use crate::error::{ApiDiffError, Result};
use crate::node::{ConstQualifier, StorageClass};
use std::path::Path;

/// 支持的编程语言枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedLanguage {
    C,
    // 未来支持的语言
    // Cpp,
}

/// 通用前端接口
pub trait LanguageFrontend: Send {
    /// 解析一个编译单元，按源码顺序产出原始声明事件
    fn extract_declarations(&mut self, source: &str) -> Result<Vec<RawDeclaration>>;

    /// 获取语言名称
    fn language_name(&self) -> &'static str;

    /// 获取支持的文件扩展名
    fn file_extensions(&self) -> &'static [&'static str];
}

/// 前端工厂
pub struct FrontendFactory;

impl FrontendFactory {
    /// 根据语言类型创建前端
    pub fn create_frontend(language: SupportedLanguage) -> Result<Box<dyn LanguageFrontend>> {
        match language {
            SupportedLanguage::C => Ok(Box::new(super::c::CFrontend::new()?)),
        }
    }

    /// 根据文件路径检测语言类型
    pub fn detect_language(file_path: &Path) -> Option<SupportedLanguage> {
        match file_path.extension()?.to_str()? {
            "c" | "h" => Some(SupportedLanguage::C),
            _ => None,
        }
    }

    /// 根据文件路径创建对应的前端
    pub fn create_frontend_for_file(file_path: &Path) -> Result<Box<dyn LanguageFrontend>> {
        let language = Self::detect_language(file_path).ok_or_else(|| {
            ApiDiffError::UnsupportedFileType(file_path.to_string_lossy().to_string())
        })?;
        Self::create_frontend(language)
    }
}

/// 一条原始声明事件
#[derive(Debug, Clone)]
pub enum RawDeclaration {
    Record(RawRecord),
    Enum(RawEnum),
    Function(RawFunction),
    Variable(RawVariable),
    Field(RawField),
    Typedef(RawTypedef),
}

impl RawDeclaration {
    /// 主编译单元归属谓词
    pub fn from_primary_unit(&self) -> bool {
        match self {
            RawDeclaration::Record(d) => d.from_primary_unit,
            RawDeclaration::Enum(d) => d.from_primary_unit,
            RawDeclaration::Function(d) => d.from_primary_unit,
            RawDeclaration::Variable(d) => d.from_primary_unit,
            RawDeclaration::Field(d) => d.from_primary_unit,
            RawDeclaration::Typedef(d) => d.from_primary_unit,
        }
    }
}

/// 记录类型的关键字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKeyword {
    Class,
    Struct,
    Union,
}

/// 声明类型引用的标签（struct/union/enum）信息
#[derive(Debug, Clone)]
pub struct RawTagRef {
    /// 标签是否拥有可链接的名称
    pub has_linkage_name: bool,
    /// 标签是否定义于主编译单元
    pub from_primary_unit: bool,
}

/// 一个声明的底层类型
#[derive(Debug, Clone)]
pub struct RawType {
    /// 规范化空白后的类型文本
    pub spelling: String,
    /// 类型是否不完整（无法解析出完整定义）
    pub is_incomplete: bool,
    /// const 限定
    pub const_qualifier: ConstQualifier,
    /// 解包后得到的函数原型（函数指针类型）
    pub function_proto: Option<Box<RawFunctionProto>>,
    /// 被引用的标签类型
    pub tag: Option<RawTagRef>,
}

impl RawType {
    /// 简单拼写的类型
    pub fn plain(spelling: impl Into<String>) -> Self {
        Self {
            spelling: spelling.into(),
            is_incomplete: false,
            const_qualifier: ConstQualifier::None,
            function_proto: None,
            tag: None,
        }
    }
}

/// 函数指针指向的函数签名
#[derive(Debug, Clone)]
pub struct RawFunctionProto {
    pub parameters: Vec<RawParameter>,
    pub return_type: RawType,
}

/// 一个参数
#[derive(Debug, Clone)]
pub struct RawParameter {
    pub name: Option<String>,
    pub ty: RawType,
    pub is_valid: bool,
}

/// 记录（struct/union）声明
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub keyword: RecordKeyword,
    pub name: Option<String>,
    pub from_primary_unit: bool,
    pub is_definition: bool,
    pub is_packed: bool,
    /// 匿名记录仅通过相邻 typedef 拼写时，该 typedef 的名称
    pub typedef_name_for_anon: Option<String>,
    /// 成员声明，按源码顺序
    pub members: Vec<RawDeclaration>,
}

/// 枚举声明
#[derive(Debug, Clone)]
pub struct RawEnum {
    pub name: Option<String>,
    pub from_primary_unit: bool,
    pub is_valid: bool,
    /// 底层整数类型
    pub underlying_type: String,
    /// 匿名枚举仅作为相邻字段/变量的无名类型存在
    pub bound_to_adjacent_value: bool,
    pub typedef_name_for_anon: Option<String>,
    /// 枚举常量名，按声明顺序
    pub enumerators: Vec<String>,
}

/// 函数声明（原型或定义）
#[derive(Debug, Clone)]
pub struct RawFunction {
    pub name: String,
    pub from_primary_unit: bool,
    pub is_valid: bool,
    pub storage: StorageClass,
    pub is_inline: bool,
    /// 在源码中显式拼写的调用约定，逐字保留
    pub calling_convention: Option<String>,
    pub parameters: Vec<RawParameter>,
    pub return_type: RawType,
}

/// 变量声明
#[derive(Debug, Clone)]
pub struct RawVariable {
    pub name: Option<String>,
    pub from_primary_unit: bool,
    pub is_valid: bool,
    pub has_global_storage: bool,
    pub storage: StorageClass,
    pub ty: RawType,
}

/// 记录成员字段声明
#[derive(Debug, Clone)]
pub struct RawField {
    pub name: Option<String>,
    pub from_primary_unit: bool,
    pub is_valid: bool,
    pub ty: RawType,
}

/// typedef 声明
#[derive(Debug, Clone)]
pub struct RawTypedef {
    pub name: String,
    pub from_primary_unit: bool,
    pub underlying: RawType,
    /// 声明符中内嵌定义的标签
    pub embedded_tag: Option<RawEmbeddedTag>,
}

/// typedef 声明符中内嵌的标签信息
#[derive(Debug, Clone)]
pub struct RawEmbeddedTag {
    /// 折叠进排除集的名称片段：标签自身的名称，或治理它的 typedef 名称
    pub segment: String,
    /// 标签同时被相邻的值声明占用
    pub claimed_by_adjacent_value: bool,
}
