//! 差异报告的稳定令牌定义
//!
//! 报告中出现的所有 JSON 键、变更标签和限定符令牌都集中在这里，
//! 保证相同输入在任何环境下产生逐字节一致的输出

/// 无法解析的类型所使用的占位符
pub const DATA_TYPE_PLACEHOLDER: &str = "(un-resolved Type)";

// 变更标签
pub const ADDED: &str = "added";
pub const REMOVED: &str = "removed";
pub const MODIFIED: &str = "modified";
pub const REORDERED: &str = "re-ordered";

// JSON 键
pub const QUALIFIED_NAME: &str = "qualifiedName";
pub const NODE_TYPE: &str = "nodeType";
pub const TAG: &str = "tag";
pub const CHILDREN: &str = "children";
pub const DATA_TYPE: &str = "dataType";
pub const STORAGE_QUALIFIER: &str = "storageQualifier";
pub const CONST_QUALIFIER: &str = "constQualifier";
pub const VIRTUAL_QUALIFIER: &str = "virtualQualifier";
pub const FUNCTION_CALLING_CONVENTION: &str = "functionCallingConvention";
pub const PACKED: &str = "packed";
pub const INLINE: &str = "inline";

use crate::node::{ConstQualifier, NodeKind, StorageClass, VirtualQualifier};

/// 存储类限定符的报告令牌，None 序列化为空令牌
pub fn storage_token(storage: StorageClass) -> &'static str {
    match storage {
        StorageClass::Static => "Static",
        StorageClass::Extern => "Extern",
        StorageClass::Register => "Register",
        StorageClass::Auto => "Auto",
        StorageClass::None => "",
    }
}

/// const 限定符的报告令牌
pub fn const_token(qualifier: ConstQualifier) -> &'static str {
    match qualifier {
        ConstQualifier::Const => "Const",
        ConstQualifier::ConstExpr => "ConstExpr",
        ConstQualifier::None => "",
    }
}

/// virtual 限定符的报告令牌
pub fn virtual_token(qualifier: VirtualQualifier) -> &'static str {
    match qualifier {
        VirtualQualifier::Virtual => "Virtual",
        VirtualQualifier::PureVirtual => "PureVirtual",
        VirtualQualifier::Override => "Override",
        VirtualQualifier::None => "",
    }
}

/// 节点种类的报告令牌
pub fn kind_token(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Namespace => "Namespace",
        NodeKind::Class => "Class",
        NodeKind::Struct => "Struct",
        NodeKind::Union => "Union",
        NodeKind::Enum => "Enum",
        NodeKind::Function => "Function",
        NodeKind::Method => "Method",
        NodeKind::Field => "Field",
        NodeKind::Typedef => "Typedef",
        NodeKind::TypeAlias => "TypeAlias",
        NodeKind::Parameter => "Parameter",
        NodeKind::TemplateParam => "TemplateParam",
        NodeKind::BaseClass => "BaseClass",
        NodeKind::Variable => "Variable",
        NodeKind::ReturnType => "ReturnType",
        NodeKind::Enumerator => "Enumerator",
        NodeKind::Macro => "Macro",
        NodeKind::If => "If",
        NodeKind::Elif => "Elif",
        NodeKind::Ifdef => "Ifdef",
        NodeKind::Ifndef => "Ifndef",
        NodeKind::Elifndef => "Elifndef",
        NodeKind::Else => "Else",
        NodeKind::Endif => "Endif",
        NodeKind::Elifdef => "Elifdef",
        NodeKind::Define => "Define",
        NodeKind::ConditionalCompilation => "ConditionalCompilation",
        NodeKind::FunctionPointer => "FunctionPointer",
        NodeKind::Unknown => "Unknown",
    }
}
