//! 声明规范化器
//!
//! 消费前端交付的原始声明事件流，应用每种声明类别的规范化规则，
//! 将规范化节点写入 `NormalizedContext`。每条规则返回 bool：
//! true 表示产生并挂接了节点，false 表示有意抑制；抑制从不是错误。
//! 作用域栈和父节点链都是单次运行的局部状态，基线与候选两次
//! 规范化因此完全独立，可以并行执行

use crate::context::NormalizedContext;
use crate::node::{ApiNode, NodeKind};
use crate::parser::{
    RawDeclaration, RawEnum, RawField, RawFunction, RawFunctionProto, RawRecord, RawType,
    RawTypedef, RawVariable, RecordKeyword,
};
use crate::scope::{RETURN_TYPE_SEGMENT, ScopeTracker};
use crate::token::DATA_TYPE_PLACEHOLDER;
use tracing::debug;

/// 一次规范化运行
#[derive(Debug, Default)]
pub struct Normalizer {
    scope: ScopeTracker,
}

impl Normalizer {
    /// 创建新的规范化器
    pub fn new() -> Self {
        Self::default()
    }

    /// 规范化一个编译单元的声明流，产出该快照的上下文
    pub fn normalize_unit(&mut self, declarations: &[RawDeclaration]) -> NormalizedContext {
        let mut context = NormalizedContext::new();
        self.normalize_into(declarations, &mut context);
        context
    }

    /// 将声明流追加规范化进一个已有上下文（目录快照逐单元调用）
    pub fn normalize_into(
        &mut self,
        declarations: &[RawDeclaration],
        context: &mut NormalizedContext,
    ) {
        for declaration in declarations {
            self.normalize_declaration(declaration, context, None);
        }
    }

    fn normalize_declaration(
        &mut self,
        declaration: &RawDeclaration,
        context: &mut NormalizedContext,
        parent: Option<&mut ApiNode>,
    ) -> bool {
        match declaration {
            RawDeclaration::Record(record) => self.build_record(record, context, parent),
            RawDeclaration::Enum(raw_enum) => self.build_enum(raw_enum, context, parent),
            RawDeclaration::Function(function) => self.build_function(function, context, parent),
            RawDeclaration::Variable(variable) => self.build_variable(variable, context, parent),
            RawDeclaration::Field(field) => self.build_field(field, context, parent),
            RawDeclaration::Typedef(typedef) => self.build_typedef(typedef, context),
        }
    }

    /// 挂接节点：有父节点时成为其子节点，否则注册为上下文的根
    fn attach(node: ApiNode, context: &mut NormalizedContext, parent: Option<&mut ApiNode>) {
        match parent {
            Some(parent) => parent.push_child(node),
            None => context.add_root(node),
        }
    }

    /// 记录规则：只有主单元中带名字的 struct/union 定义才会产出节点。
    /// class 类别被策略性排除；仅通过相邻 typedef 拼写的匿名记录
    /// 也不产出自身节点（排除集副作用由 typedef 规则完成）
    fn build_record(
        &mut self,
        record: &RawRecord,
        context: &mut NormalizedContext,
        parent: Option<&mut ApiNode>,
    ) -> bool {
        if !record.from_primary_unit
            || record.keyword == RecordKeyword::Class
            || !record.is_definition
        {
            return false;
        }
        let Some(name) = record.name.as_deref().filter(|n| !n.is_empty()) else {
            return false;
        };
        if record.typedef_name_for_anon.is_some() {
            return false;
        }

        self.scope.push(name);
        let qualified_name = self.scope.current_qualified_name();

        // 顶层的重复定义/前置声明对：幂等跳过
        if parent.is_none() && context.contains_root(&qualified_name) {
            self.scope.pop();
            return false;
        }

        debug!("visit record: {qualified_name}");

        let kind = match record.keyword {
            RecordKeyword::Struct => NodeKind::Struct,
            RecordKeyword::Union => NodeKind::Union,
            RecordKeyword::Class => unreachable!("class records are excluded above"),
        };
        let mut node = ApiNode::new(kind, qualified_name);
        node.is_packed = record.is_packed;

        for member in &record.members {
            self.normalize_declaration(member, context, Some(&mut node));
        }

        self.scope.pop();
        Self::attach(node, context, parent);
        true
    }

    /// 枚举规则：仅作为相邻字段/变量无名类型存在的匿名枚举被整体
    /// 抑制；具名枚举产出复合节点，每个枚举常量成为一个 Enumerator
    /// 子节点，dataType 为枚举的底层整数类型（声明无效时为占位符）
    fn build_enum(
        &mut self,
        raw_enum: &RawEnum,
        context: &mut NormalizedContext,
        parent: Option<&mut ApiNode>,
    ) -> bool {
        if !raw_enum.from_primary_unit || raw_enum.bound_to_adjacent_value {
            return false;
        }
        if raw_enum.typedef_name_for_anon.is_some() {
            return false;
        }
        let Some(name) = raw_enum.name.as_deref().filter(|n| !n.is_empty()) else {
            return false;
        };

        self.scope.push(name);
        let qualified_name = self.scope.current_qualified_name();
        debug!("visit enum: {qualified_name}");

        let mut node = ApiNode::new(NodeKind::Enum, qualified_name);
        let enumerator_data_type = if raw_enum.is_valid {
            raw_enum.underlying_type.clone()
        } else {
            DATA_TYPE_PLACEHOLDER.to_string()
        };

        for enumerator in &raw_enum.enumerators {
            self.scope.push(enumerator);
            let mut value_node = ApiNode::new(NodeKind::Enumerator, self.scope.current_qualified_name());
            value_node.data_type = enumerator_data_type.clone();
            self.scope.pop();
            node.push_child(value_node);
        }

        self.scope.pop();
        Self::attach(node, context, parent);
        true
    }

    /// 函数规则：主单元函数总是产出节点。参数按声明顺序规范化为
    /// 子节点，最后追加合成的 ReturnType 子节点；显式拼写的调用
    /// 约定逐字保留
    fn build_function(
        &mut self,
        function: &RawFunction,
        context: &mut NormalizedContext,
        parent: Option<&mut ApiNode>,
    ) -> bool {
        if !function.from_primary_unit {
            return false;
        }

        self.scope.push(&function.name);
        let qualified_name = self.scope.current_qualified_name();

        // 原型与定义成对出现时，首个已注册的节点保持不变
        if parent.is_none() && context.contains_root(&qualified_name) {
            self.scope.pop();
            return false;
        }

        debug!("visit function: {qualified_name}");

        let mut node = ApiNode::new(NodeKind::Function, qualified_name);
        node.storage = function.storage;
        node.is_inline = function.is_inline;
        if let Some(convention) = &function.calling_convention {
            debug!("calling convention: {convention}");
            node.function_calling_convention = convention.clone();
        }

        for parameter in &function.parameters {
            let parameter_node = self.build_value_node(
                NodeKind::Parameter,
                parameter.name.as_deref(),
                &parameter.ty,
                parameter.is_valid,
            );
            node.push_child(parameter_node);
        }
        self.append_return_type(&function.return_type, &mut node);

        self.scope.pop();
        Self::attach(node, context, parent);
        true
    }

    /// 全局变量规则：非主单元、非全局存储或无效的声明被跳过；
    /// 声明类型为主单元中无链接名的匿名标签时自我抑制
    fn build_variable(
        &mut self,
        variable: &RawVariable,
        context: &mut NormalizedContext,
        parent: Option<&mut ApiNode>,
    ) -> bool {
        if !variable.from_primary_unit || !variable.has_global_storage || !variable.is_valid {
            return false;
        }
        if Self::has_unnameable_tag_type(&variable.ty) {
            return false;
        }

        let mut node = self.build_value_node(
            NodeKind::Variable,
            variable.name.as_deref(),
            &variable.ty,
            variable.is_valid,
        );
        node.storage = variable.storage;
        debug!("visit variable: {}", node.qualified_name);
        Self::attach(node, context, parent);
        true
    }

    /// 字段规则：与全局变量规则同样抑制匿名不可命名标签类型的成员
    fn build_field(
        &mut self,
        field: &RawField,
        context: &mut NormalizedContext,
        parent: Option<&mut ApiNode>,
    ) -> bool {
        if !field.from_primary_unit {
            return false;
        }
        if Self::has_unnameable_tag_type(&field.ty) {
            return false;
        }

        let node =
            self.build_value_node(NodeKind::Field, field.name.as_deref(), &field.ty, field.is_valid);
        debug!("visit field: {}", node.qualified_name);
        Self::attach(node, context, parent);
        true
    }

    /// typedef 规则：从不产出自身节点。唯一的副作用是条件性的：
    /// 底层类型是声明符中内嵌的记录、或命名了函数指针类型时，
    /// 其限定名进入排除集 —— 这条身份被折叠进了目标声明
    fn build_typedef(&mut self, typedef: &RawTypedef, context: &mut NormalizedContext) -> bool {
        if !typedef.from_primary_unit {
            return false;
        }

        if let Some(embedded) = &typedef.embedded_tag {
            if !embedded.claimed_by_adjacent_value {
                self.scope.push(&embedded.segment);
                context.exclude(self.scope.current_qualified_name());
                self.scope.pop();
            }
        } else if typedef.underlying.function_proto.is_some() {
            self.scope.push(&typedef.name);
            context.exclude(self.scope.current_qualified_name());
            self.scope.pop();
        }

        false
    }

    /// 值声明（参数/字段/变量）的公共构造：解析 dataType 或降级为
    /// 占位符；无名声明获得合成作用域片段；类型解包为函数指针时
    /// 展开为 FunctionPointer 子树而不保留标量 dataType
    fn build_value_node(
        &mut self,
        kind: NodeKind,
        name: Option<&str>,
        ty: &RawType,
        is_valid: bool,
    ) -> ApiNode {
        let data_type = if !is_valid || ty.is_incomplete {
            DATA_TYPE_PLACEHOLDER.to_string()
        } else {
            ty.spelling.clone()
        };

        match name.filter(|n| !n.is_empty()) {
            Some(name) => self.scope.push(name),
            None => self.scope.push_anonymous_value(&data_type),
        }

        let mut node = ApiNode::new(kind, self.scope.current_qualified_name());
        node.const_qualifier = ty.const_qualifier;

        if let Some(proto) = &ty.function_proto {
            self.expand_function_pointer(&ty.spelling, proto, &mut node);
        } else {
            node.data_type = data_type;
        }

        self.scope.pop();
        node
    }

    /// 函数指针展开：在持有声明的限定名处锚定一个 FunctionPointer
    /// 复合节点，dataType 为未展开的原始类型文本，子节点为指向
    /// 函数签名的各参数和一个 ReturnType
    fn expand_function_pointer(
        &mut self,
        spelling: &str,
        proto: &RawFunctionProto,
        owner: &mut ApiNode,
    ) {
        let mut pointer_node =
            ApiNode::new(NodeKind::FunctionPointer, self.scope.current_qualified_name());
        pointer_node.data_type = spelling.to_string();

        for parameter in &proto.parameters {
            let parameter_node = self.build_value_node(
                NodeKind::Parameter,
                parameter.name.as_deref(),
                &parameter.ty,
                parameter.is_valid,
            );
            pointer_node.push_child(parameter_node);
        }
        self.append_return_type(&proto.return_type, &mut pointer_node);

        owner.push_child(pointer_node);
    }

    /// 追加返回值伪成员
    fn append_return_type(&mut self, return_type: &RawType, parent: &mut ApiNode) {
        self.scope.push(RETURN_TYPE_SEGMENT);
        let mut node = ApiNode::new(NodeKind::ReturnType, self.scope.current_qualified_name());
        node.data_type = if return_type.is_incomplete {
            DATA_TYPE_PLACEHOLDER.to_string()
        } else {
            return_type.spelling.clone()
        };
        self.scope.pop();
        parent.push_child(node);
    }

    fn has_unnameable_tag_type(ty: &RawType) -> bool {
        ty.tag
            .as_ref()
            .is_some_and(|tag| tag.from_primary_unit && !tag.has_linkage_name)
    }
}
