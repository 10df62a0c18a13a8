//! API 树节点数据模型
//!
//! 定义规范化后的声明树节点 `ApiNode`，以及节点对之间的
//! 标量字段级差异比较（差异引擎的第二层）

use crate::diff::{DiffEntry, FieldValue};
use crate::token::{
    self, CONST_QUALIFIER, DATA_TYPE, DATA_TYPE_PLACEHOLDER, FUNCTION_CALLING_CONVENTION, INLINE,
    PACKED, STORAGE_QUALIFIER, VIRTUAL_QUALIFIER,
};
use std::collections::BTreeMap;

/// 声明种类的封闭枚举
///
/// 条件编译相关的种类只保留在词汇表中，规范化阶段不会产生它们
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Namespace,
    Class,
    Struct,
    Union,
    Enum,
    Function,
    Method,
    Field,
    Typedef,
    TypeAlias,
    Parameter,
    TemplateParam,
    BaseClass,
    Variable,
    ReturnType,
    Enumerator,
    Macro,
    If,
    Elif,
    Ifdef,
    Ifndef,
    Elifndef,
    Else,
    Endif,
    Elifdef,
    Define,
    ConditionalCompilation,
    FunctionPointer,
    Unknown,
}

impl NodeKind {
    /// 该种类的节点是否为复合节点（拥有子节点序列，即使为空）
    ///
    /// 值声明（Parameter/Field/Variable）也是复合的：
    /// 函数指针类型会在其下展开为 FunctionPointer 子树
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            NodeKind::Namespace
                | NodeKind::Class
                | NodeKind::Struct
                | NodeKind::Union
                | NodeKind::Enum
                | NodeKind::Function
                | NodeKind::Method
                | NodeKind::FunctionPointer
                | NodeKind::Field
                | NodeKind::Parameter
                | NodeKind::Variable
        )
    }
}

/// 存储类限定符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageClass {
    #[default]
    None,
    Static,
    Extern,
    Register,
    Auto,
}

/// const 限定符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConstQualifier {
    #[default]
    None,
    Const,
    ConstExpr,
}

/// virtual 限定符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VirtualQualifier {
    #[default]
    None,
    Virtual,
    PureVirtual,
    Override,
}

/// 规范化后的一条声明
///
/// 节点由一次规范化遍历构造，挂接到父节点或上下文根列表后不再修改。
/// `children` 的有无由 `kind` 固定：复合种类始终携带（可能为空的）
/// 子节点序列，叶子种类永远没有
#[derive(Debug, Clone, PartialEq)]
pub struct ApiNode {
    pub kind: NodeKind,
    pub qualified_name: String,
    pub data_type: String,
    pub storage: StorageClass,
    pub const_qualifier: ConstQualifier,
    pub virtual_qualifier: VirtualQualifier,
    pub is_inline: bool,
    pub is_packed: bool,
    pub function_calling_convention: String,
    pub children: Option<Vec<ApiNode>>,
}

impl ApiNode {
    /// 创建指定种类和限定名的节点，子节点序列的有无由种类决定
    pub fn new(kind: NodeKind, qualified_name: impl Into<String>) -> Self {
        Self {
            kind,
            qualified_name: qualified_name.into(),
            data_type: String::new(),
            storage: StorageClass::None,
            const_qualifier: ConstQualifier::None,
            virtual_qualifier: VirtualQualifier::None,
            is_inline: false,
            is_packed: false,
            function_calling_convention: String::new(),
            children: if kind.is_composite() {
                Some(Vec::new())
            } else {
                None
            },
        }
    }

    /// 该节点是否为复合节点
    pub fn is_composite(&self) -> bool {
        self.children.is_some()
    }

    /// 子节点切片，叶子节点返回空切片
    pub fn children(&self) -> &[ApiNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// 向复合节点追加一个子节点
    ///
    /// 对叶子节点调用属于内部错误
    pub fn push_child(&mut self, child: ApiNode) {
        let children = self
            .children
            .as_mut()
            .unwrap_or_else(|| panic!("leaf node {:?} cannot own children", self.kind));
        children.push(child);
    }

    /// 标量字段级差异（第二层比较）
    ///
    /// 返回至多两个条目：基线侧的 removed 值条目和候选侧的 added
    /// 值条目，每个条目只收录与对侧不同且非默认哨值的字段。
    /// 任一侧的 `dataType` 为占位符时完全跳过该字段的比较
    pub fn field_change_entries(&self, other: &ApiNode) -> Vec<DiffEntry> {
        let mut removed: BTreeMap<&'static str, FieldValue> = BTreeMap::new();
        let mut added: BTreeMap<&'static str, FieldValue> = BTreeMap::new();

        let mut compare_text = |field: &'static str, lhs: &str, rhs: &str| {
            if lhs != rhs {
                if !lhs.is_empty() {
                    removed.insert(field, FieldValue::Text(lhs.to_string()));
                }
                if !rhs.is_empty() {
                    added.insert(field, FieldValue::Text(rhs.to_string()));
                }
            }
        };

        if self.data_type != DATA_TYPE_PLACEHOLDER && other.data_type != DATA_TYPE_PLACEHOLDER {
            compare_text(DATA_TYPE, &self.data_type, &other.data_type);
        }
        compare_text(
            STORAGE_QUALIFIER,
            token::storage_token(self.storage),
            token::storage_token(other.storage),
        );
        compare_text(
            CONST_QUALIFIER,
            token::const_token(self.const_qualifier),
            token::const_token(other.const_qualifier),
        );
        compare_text(
            VIRTUAL_QUALIFIER,
            token::virtual_token(self.virtual_qualifier),
            token::virtual_token(other.virtual_qualifier),
        );
        compare_text(
            FUNCTION_CALLING_CONVENTION,
            &self.function_calling_convention,
            &other.function_calling_convention,
        );

        let mut compare_flag = |field: &'static str, lhs: bool, rhs: bool| {
            if lhs != rhs {
                if lhs {
                    removed.insert(field, FieldValue::Flag(lhs));
                }
                if rhs {
                    added.insert(field, FieldValue::Flag(rhs));
                }
            }
        };

        compare_flag(INLINE, self.is_inline, other.is_inline);
        compare_flag(PACKED, self.is_packed, other.is_packed);

        let mut entries = Vec::new();
        if !removed.is_empty() {
            entries.push(DiffEntry::value_entry(self, token::REMOVED, removed));
        }
        if !added.is_empty() {
            entries.push(DiffEntry::value_entry(other, token::ADDED, added));
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function_node(name: &str) -> ApiNode {
        ApiNode::new(NodeKind::Function, name)
    }

    #[test]
    fn test_composite_kinds_own_children_sequence() {
        assert!(ApiNode::new(NodeKind::Struct, "S").children.is_some());
        assert!(ApiNode::new(NodeKind::Function, "f").children.is_some());
        assert!(ApiNode::new(NodeKind::Parameter, "f::p").children.is_some());
        assert!(ApiNode::new(NodeKind::FunctionPointer, "cb").children.is_some());

        assert!(ApiNode::new(NodeKind::ReturnType, "f::(returnType)").children.is_none());
        assert!(ApiNode::new(NodeKind::Enumerator, "E::A").children.is_none());
        assert!(ApiNode::new(NodeKind::Typedef, "T").children.is_none());
    }

    #[test]
    #[should_panic(expected = "cannot own children")]
    fn test_attaching_child_to_leaf_panics() {
        let mut leaf = ApiNode::new(NodeKind::ReturnType, "f::(returnType)");
        leaf.push_child(ApiNode::new(NodeKind::Parameter, "p"));
    }

    #[test]
    fn test_identical_nodes_have_no_field_changes() {
        let a = function_node("foo");
        let b = function_node("foo");
        assert!(a.field_change_entries(&b).is_empty());
    }

    #[test]
    fn test_default_sentinel_suppresses_removed_entry() {
        // 场景 A：基线 storage=None，候选 storage=Static，
        // 只应产生 added 条目，没有 removed 条目
        let baseline = function_node("foo");
        let mut candidate = function_node("foo");
        candidate.storage = StorageClass::Static;

        let entries = baseline.field_change_entries(&candidate);
        assert_eq!(entries.len(), 1);

        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["tag"], "added");
        assert_eq!(json["nodeType"], "Function");
        assert_eq!(json["qualifiedName"], "foo");
        assert_eq!(json["storageQualifier"], "Static");
    }

    #[test]
    fn test_changed_value_emits_both_sides() {
        let mut baseline = function_node("foo");
        baseline.storage = StorageClass::Extern;
        let mut candidate = function_node("foo");
        candidate.storage = StorageClass::Static;

        let entries = baseline.field_change_entries(&candidate);
        assert_eq!(entries.len(), 2);

        let removed = serde_json::to_value(&entries[0]).unwrap();
        let added = serde_json::to_value(&entries[1]).unwrap();
        assert_eq!(removed["tag"], "removed");
        assert_eq!(removed["storageQualifier"], "Extern");
        assert_eq!(added["tag"], "added");
        assert_eq!(added["storageQualifier"], "Static");
    }

    #[test]
    fn test_placeholder_data_type_is_never_compared() {
        let mut baseline = ApiNode::new(NodeKind::Parameter, "f::x");
        baseline.data_type = DATA_TYPE_PLACEHOLDER.to_string();
        let mut candidate = ApiNode::new(NodeKind::Parameter, "f::x");
        candidate.data_type = "int".to_string();

        assert!(baseline.field_change_entries(&candidate).is_empty());
        assert!(candidate.field_change_entries(&baseline).is_empty());
    }

    #[test]
    fn test_boolean_fields_use_false_sentinel() {
        let baseline = function_node("foo");
        let mut candidate = function_node("foo");
        candidate.is_inline = true;

        let entries = baseline.field_change_entries(&candidate);
        assert_eq!(entries.len(), 1);
        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["tag"], "added");
        assert_eq!(json["inline"], true);

        // 反向比较时 inline 从 true 变为 false，只产生 removed 条目
        let entries = candidate.field_change_entries(&baseline);
        assert_eq!(entries.len(), 1);
        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["tag"], "removed");
        assert_eq!(json["inline"], true);
    }

    #[test]
    fn test_calling_convention_is_compared_verbatim() {
        let mut baseline = function_node("foo");
        baseline.function_calling_convention = "__cdecl".to_string();
        let mut candidate = function_node("foo");
        candidate.function_calling_convention = "__stdcall".to_string();

        let entries = baseline.field_change_entries(&candidate);
        assert_eq!(entries.len(), 2);
        let removed = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(removed["functionCallingConvention"], "__cdecl");
    }
}
