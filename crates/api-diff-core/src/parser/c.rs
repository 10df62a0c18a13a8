//! 基于 tree-sitter-c 的 C 语言前端
//!
//! 遍历一个翻译单元的语法树，按源码顺序产出原始声明事件。
//! 这里只提取事实：名称、类型拼写、限定符、签名形状、
//! 匿名类型的相邻关系；所有取舍规则都留给规范化器

use crate::error::{ApiDiffError, Result};
use crate::node::{ConstQualifier, StorageClass};
use crate::parser::common::{
    LanguageFrontend, RawDeclaration, RawEmbeddedTag, RawEnum, RawField, RawFunction,
    RawFunctionProto, RawParameter, RawRecord, RawTagRef, RawType, RawTypedef, RawVariable,
    RecordKeyword,
};
use regex::Regex;
use tree_sitter::{Node, Parser, Tree};

/// C 前端
pub struct CFrontend {
    parser: Parser,
    whitespace: Regex,
}

/// 声明符解析出的形状
#[derive(Default)]
struct DeclaratorShape<'t> {
    /// 被声明的标识符
    name: Option<Node<'t>>,
    /// 最外层的函数声明符（参数列表）
    parameters: Option<Node<'t>>,
    /// 函数声明符内部是否为括号包裹的指针（函数指针形状）
    is_function_pointer: bool,
    /// 在遇到函数声明符之前经过的指针层数，作用于返回类型
    pointers_before_function: usize,
    /// 声明符中拼写的调用约定
    calling_convention: Option<String>,
}

impl CFrontend {
    /// 创建新的 C 前端
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .map_err(|e| ApiDiffError::TreeSitterError(format!("Failed to load C grammar: {e}")))?;
        Ok(Self {
            parser,
            whitespace: Regex::new(r"\s+").expect("whitespace pattern is valid"),
        })
    }

    /// 解析源码为语法树
    pub fn parse_source(&mut self, source: &str) -> Result<Tree> {
        self.parser.parse(source, None).ok_or_else(|| {
            ApiDiffError::TreeSitterError("Parser returned no syntax tree".to_string())
        })
    }

    fn text<'s>(node: Node, source: &'s str) -> &'s str {
        &source[node.byte_range()]
    }

    /// 折叠空白，保证类型拼写在两次运行间字节一致
    fn normalize(&self, text: &str) -> String {
        self.whitespace.replace_all(text.trim(), " ").into_owned()
    }

    fn extract_top_level(&self, node: Node, source: &str, out: &mut Vec<RawDeclaration>) {
        match node.kind() {
            "function_definition" => {
                if let Some(function) = self.extract_function(node, source) {
                    out.push(RawDeclaration::Function(function));
                }
            }
            "declaration" => self.extract_declaration(node, source, out),
            "struct_specifier" | "union_specifier" => {
                if node.child_by_field_name("body").is_some() {
                    out.push(RawDeclaration::Record(self.extract_record(node, source, None)));
                }
            }
            "enum_specifier" => {
                if node.child_by_field_name("body").is_some() {
                    out.push(RawDeclaration::Enum(self.extract_enum(node, source, false, None)));
                }
            }
            "type_definition" => self.extract_typedef(node, source, out),
            _ => {}
        }
    }

    /// 处理一条 declaration：先交付类型位置上内嵌定义的标签，
    /// 再逐个声明符交付函数原型或变量
    fn extract_declaration(&self, node: Node, source: &str, out: &mut Vec<RawDeclaration>) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };

        let mut storage = StorageClass::None;
        let mut is_inline = false;
        let mut const_qualifier = ConstQualifier::None;
        let mut calling_convention = None;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "storage_class_specifier" => match Self::text(child, source) {
                    "static" => storage = StorageClass::Static,
                    "extern" => storage = StorageClass::Extern,
                    "register" => storage = StorageClass::Register,
                    "auto" => storage = StorageClass::Auto,
                    "inline" | "__inline" | "__inline__" | "__forceinline" => is_inline = true,
                    _ => {}
                },
                "type_qualifier" => match Self::text(child, source) {
                    "const" => const_qualifier = ConstQualifier::Const,
                    "constexpr" => const_qualifier = ConstQualifier::ConstExpr,
                    _ => {}
                },
                "ms_call_modifier" => {
                    calling_convention = Some(Self::text(child, source).to_string());
                }
                _ => {}
            }
        }

        // `int __cdecl f(void);` 里的 ms_call_modifier 同样挂在
        // declarator 字段上，它不是声明符，收集时要剔除
        let mut declarator_cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut declarator_cursor)
            .filter(|n| !matches!(n.kind(), "ms_call_modifier" | "gnu_asm_expression"))
            .collect();

        self.emit_embedded_tag(type_node, source, !declarators.is_empty(), None, out);

        for declarator in declarators {
            let declarator = Self::unwrap_init_declarator(declarator);
            let mut shape = DeclaratorShape::default();
            self.analyze_declarator(declarator, source, &mut shape);
            if shape.calling_convention.is_none() {
                shape.calling_convention = calling_convention.clone();
            }

            if shape.parameters.is_some() && !shape.is_function_pointer {
                // 函数原型
                if let Some(function) =
                    self.build_function(node, type_node, &shape, storage, is_inline, source)
                {
                    out.push(RawDeclaration::Function(function));
                }
            } else {
                let (ty, name) =
                    self.build_raw_type(type_node, Some(declarator), const_qualifier, source);
                out.push(RawDeclaration::Variable(RawVariable {
                    name,
                    from_primary_unit: true,
                    is_valid: !node.has_error(),
                    has_global_storage: true,
                    storage,
                    ty,
                }));
            }
        }
    }

    fn extract_function(&self, node: Node, source: &str) -> Option<RawFunction> {
        let type_node = node.child_by_field_name("type")?;
        let declarator = node.child_by_field_name("declarator")?;

        let mut storage = StorageClass::None;
        let mut is_inline = false;
        let mut calling_convention = None;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "storage_class_specifier" => match Self::text(child, source) {
                    "static" => storage = StorageClass::Static,
                    "extern" => storage = StorageClass::Extern,
                    "inline" | "__inline" | "__inline__" | "__forceinline" => is_inline = true,
                    _ => {}
                },
                "ms_call_modifier" => {
                    calling_convention = Some(Self::text(child, source).to_string());
                }
                _ => {}
            }
        }

        let mut shape = DeclaratorShape::default();
        self.analyze_declarator(declarator, source, &mut shape);
        if shape.calling_convention.is_none() {
            shape.calling_convention = calling_convention;
        }
        self.build_function(node, type_node, &shape, storage, is_inline, source)
    }

    fn build_function(
        &self,
        declaration: Node,
        type_node: Node,
        shape: &DeclaratorShape,
        storage: StorageClass,
        is_inline: bool,
        source: &str,
    ) -> Option<RawFunction> {
        let name = Self::text(shape.name?, source).to_string();
        let parameters = shape
            .parameters
            .map(|list| self.extract_parameters(list, source))
            .unwrap_or_default();
        let return_spelling =
            self.pointered_spelling(type_node, shape.pointers_before_function, source);

        Some(RawFunction {
            name,
            from_primary_unit: true,
            is_valid: !declaration.has_error(),
            storage,
            is_inline,
            calling_convention: shape.calling_convention.clone(),
            parameters,
            return_type: RawType::plain(return_spelling),
        })
    }

    fn extract_record(
        &self,
        node: Node,
        source: &str,
        typedef_name: Option<&str>,
    ) -> RawRecord {
        let keyword = if node.kind() == "union_specifier" {
            RecordKeyword::Union
        } else {
            RecordKeyword::Struct
        };
        let name = node
            .child_by_field_name("name")
            .map(|n| Self::text(n, source).to_string());
        let body = node.child_by_field_name("body");

        let mut is_packed = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(child.kind(), "attribute_specifier" | "ms_declspec_modifier")
                && Self::text(child, source).contains("packed")
            {
                is_packed = true;
            }
        }

        let mut members = Vec::new();
        if let Some(body) = body {
            let mut body_cursor = body.walk();
            for member in body.named_children(&mut body_cursor) {
                if member.kind() == "field_declaration" {
                    self.extract_field_declaration(member, source, &mut members);
                }
            }
        }

        let typedef_name_for_anon = if name.is_none() {
            typedef_name.map(str::to_string)
        } else {
            None
        };

        RawRecord {
            keyword,
            name,
            from_primary_unit: true,
            is_definition: node.child_by_field_name("body").is_some(),
            is_packed,
            typedef_name_for_anon,
            members,
        }
    }

    fn extract_field_declaration(
        &self,
        node: Node,
        source: &str,
        members: &mut Vec<RawDeclaration>,
    ) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };

        let mut const_qualifier = ConstQualifier::None;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "type_qualifier" {
                match Self::text(child, source) {
                    "const" => const_qualifier = ConstQualifier::Const,
                    "constexpr" => const_qualifier = ConstQualifier::ConstExpr,
                    _ => {}
                }
            }
        }

        let mut declarator_cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut declarator_cursor)
            .collect();

        self.emit_embedded_tag(type_node, source, !declarators.is_empty(), None, members);

        for declarator in declarators {
            let (ty, name) =
                self.build_raw_type(type_node, Some(declarator), const_qualifier, source);
            members.push(RawDeclaration::Field(RawField {
                name,
                from_primary_unit: true,
                is_valid: !node.has_error(),
                ty,
            }));
        }
    }

    fn extract_enum(
        &self,
        node: Node,
        source: &str,
        bound_to_adjacent_value: bool,
        typedef_name: Option<&str>,
    ) -> RawEnum {
        let name = node
            .child_by_field_name("name")
            .map(|n| Self::text(n, source).to_string());
        let underlying_type = node
            .child_by_field_name("underlying_type")
            .map(|n| self.normalize(Self::text(n, source)))
            .unwrap_or_else(|| "int".to_string());

        let mut enumerators = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                if child.kind() == "enumerator"
                    && let Some(enumerator_name) = child.child_by_field_name("name")
                {
                    enumerators.push(Self::text(enumerator_name, source).to_string());
                }
            }
        }

        let typedef_name_for_anon = if name.is_none() {
            typedef_name.map(str::to_string)
        } else {
            None
        };

        RawEnum {
            name,
            from_primary_unit: true,
            is_valid: !node.has_error(),
            underlying_type,
            bound_to_adjacent_value,
            typedef_name_for_anon,
            enumerators,
        }
    }

    fn extract_typedef(&self, node: Node, source: &str, out: &mut Vec<RawDeclaration>) {
        let Some(type_node) = node.child_by_field_name("type") else {
            return;
        };
        let mut declarator_cursor = node.walk();
        let declarators: Vec<Node> = node
            .children_by_field_name("declarator", &mut declarator_cursor)
            .collect();

        let mut tag_emitted = false;
        for declarator in declarators {
            let mut shape = DeclaratorShape::default();
            self.analyze_declarator(declarator, source, &mut shape);
            let Some(name_node) = shape.name else {
                continue;
            };
            let name = Self::text(name_node, source).to_string();

            let embedded_tag = if Self::is_tag_specifier(type_node)
                && type_node.child_by_field_name("body").is_some()
            {
                let segment = type_node
                    .child_by_field_name("name")
                    .map(|n| Self::text(n, source).to_string())
                    // 匿名标签的有效身份是治理它的 typedef 名称
                    .unwrap_or_else(|| name.clone());
                Some(RawEmbeddedTag {
                    segment,
                    claimed_by_adjacent_value: false,
                })
            } else {
                None
            };

            if embedded_tag.is_some() && !tag_emitted {
                self.emit_embedded_tag(type_node, source, false, Some(&name), out);
                tag_emitted = true;
            }

            let underlying = if shape.parameters.is_some() {
                let (ty, _) =
                    self.build_raw_type(type_node, Some(declarator), ConstQualifier::None, source);
                ty
            } else {
                RawType::plain(self.base_type_spelling(type_node, ConstQualifier::None, source))
            };

            out.push(RawDeclaration::Typedef(RawTypedef {
                name,
                from_primary_unit: true,
                underlying,
                embedded_tag,
            }));
        }
    }

    /// 类型位置上带定义体的标签（struct/union/enum）作为独立事件交付
    fn emit_embedded_tag(
        &self,
        type_node: Node,
        source: &str,
        has_adjacent_declarator: bool,
        typedef_name: Option<&str>,
        out: &mut Vec<RawDeclaration>,
    ) {
        if type_node.child_by_field_name("body").is_none() {
            return;
        }
        match type_node.kind() {
            "struct_specifier" | "union_specifier" => {
                out.push(RawDeclaration::Record(
                    self.extract_record(type_node, source, typedef_name),
                ));
            }
            "enum_specifier" => {
                let anonymous = type_node.child_by_field_name("name").is_none();
                let bound = anonymous && has_adjacent_declarator && typedef_name.is_none();
                out.push(RawDeclaration::Enum(
                    self.extract_enum(type_node, source, bound, typedef_name),
                ));
            }
            _ => {}
        }
    }

    fn is_tag_specifier(node: Node) -> bool {
        matches!(
            node.kind(),
            "struct_specifier" | "union_specifier" | "enum_specifier"
        )
    }

    fn extract_parameters(&self, parameter_list: Node, source: &str) -> Vec<RawParameter> {
        let mut parameters = Vec::new();
        let mut cursor = parameter_list.walk();
        for child in parameter_list.named_children(&mut cursor) {
            match child.kind() {
                "parameter_declaration" => {
                    let Some(type_node) = child.child_by_field_name("type") else {
                        continue;
                    };
                    let mut const_qualifier = ConstQualifier::None;
                    let mut qualifier_cursor = child.walk();
                    for qualifier in child.children(&mut qualifier_cursor) {
                        if qualifier.kind() == "type_qualifier"
                            && Self::text(qualifier, source) == "const"
                        {
                            const_qualifier = ConstQualifier::Const;
                        }
                    }
                    let declarator = child.child_by_field_name("declarator");
                    let (ty, name) =
                        self.build_raw_type(type_node, declarator, const_qualifier, source);
                    parameters.push(RawParameter {
                        name,
                        ty,
                        is_valid: !child.has_error(),
                    });
                }
                "variadic_parameter" => parameters.push(RawParameter {
                    name: None,
                    ty: RawType::plain("..."),
                    is_valid: true,
                }),
                _ => {}
            }
        }

        // `f(void)` 声明的是零参数函数
        if parameters.len() == 1
            && parameters[0].name.is_none()
            && parameters[0].ty.spelling == "void"
        {
            parameters.clear();
        }
        parameters
    }

    /// 从类型节点和声明符构造 RawType，同时取出被声明的名称。
    /// 拼写取类型文本拼接去掉名称后的声明符文本，空白折叠后
    /// 即为规范化的类型拼写（例如 "void (*)(int)"、"int [4]"）
    fn build_raw_type(
        &self,
        type_node: Node,
        declarator: Option<Node>,
        const_qualifier: ConstQualifier,
        source: &str,
    ) -> (RawType, Option<String>) {
        let declarator = declarator.map(Self::unwrap_init_declarator);
        let mut shape = DeclaratorShape::default();
        if let Some(declarator) = declarator {
            self.analyze_declarator(declarator, source, &mut shape);
        }
        let name = shape.name.map(|n| Self::text(n, source).to_string());

        let tag = Self::is_tag_specifier(type_node).then(|| RawTagRef {
            has_linkage_name: type_node.child_by_field_name("name").is_some(),
            from_primary_unit: true,
        });

        let base = self.base_type_spelling(type_node, const_qualifier, source);
        let suffix = declarator
            .map(|d| Self::declarator_text_without_name(d, shape.name, source))
            .unwrap_or_default();
        let spelling = self.normalize(&format!("{base} {suffix}"));

        let function_proto = shape.parameters.map(|list| {
            let return_spelling =
                self.pointered_spelling(type_node, shape.pointers_before_function, source);
            Box::new(RawFunctionProto {
                parameters: self.extract_parameters(list, source),
                return_type: RawType::plain(return_spelling),
            })
        });

        (
            RawType {
                spelling,
                is_incomplete: type_node.has_error(),
                const_qualifier,
                function_proto,
                tag,
            },
            name,
        )
    }

    /// 类型的基础拼写：带体的标签类型只取关键字和名称
    fn base_type_spelling(
        &self,
        type_node: Node,
        const_qualifier: ConstQualifier,
        source: &str,
    ) -> String {
        let base = if Self::is_tag_specifier(type_node)
            && type_node.child_by_field_name("body").is_some()
        {
            let keyword = match type_node.kind() {
                "struct_specifier" => "struct",
                "union_specifier" => "union",
                _ => "enum",
            };
            match type_node.child_by_field_name("name") {
                Some(name) => format!("{keyword} {}", Self::text(name, source)),
                None => format!("{keyword} (anonymous)"),
            }
        } else {
            self.normalize(Self::text(type_node, source))
        };
        match const_qualifier {
            ConstQualifier::None => base,
            _ => format!("const {base}"),
        }
    }

    fn pointered_spelling(&self, type_node: Node, pointers: usize, source: &str) -> String {
        let base = self.base_type_spelling(type_node, ConstQualifier::None, source);
        if pointers == 0 {
            base
        } else {
            format!("{base} {}", "*".repeat(pointers))
        }
    }

    /// 声明符文本去掉被声明的标识符，保留指针、括号、参数表、
    /// 数组后缀等类型构造
    fn declarator_text_without_name(declarator: Node, name: Option<Node>, source: &str) -> String {
        let text = Self::text(declarator, source);
        match name {
            Some(name) if name.start_byte() >= declarator.start_byte() => {
                let start = name.start_byte() - declarator.start_byte();
                let end = name.end_byte() - declarator.start_byte();
                format!("{}{}", &text[..start], &text[end..])
            }
            _ => text.to_string(),
        }
    }

    fn unwrap_init_declarator(node: Node) -> Node {
        if node.kind() == "init_declarator" {
            node.child_by_field_name("declarator").unwrap_or(node)
        } else {
            node
        }
    }

    /// 递归解包声明符，记录名称、最外层函数形状和指针层数
    fn analyze_declarator<'t>(
        &self,
        node: Node<'t>,
        source: &str,
        shape: &mut DeclaratorShape<'t>,
    ) {
        match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" => {
                if shape.name.is_none() {
                    shape.name = Some(node);
                }
            }
            "init_declarator" => {
                if let Some(inner) = node.child_by_field_name("declarator") {
                    self.analyze_declarator(inner, source, shape);
                }
            }
            "pointer_declarator" => {
                if shape.parameters.is_none() {
                    shape.pointers_before_function += 1;
                }
                if let Some(inner) = node.child_by_field_name("declarator") {
                    self.analyze_declarator(inner, source, shape);
                }
            }
            "function_declarator" => {
                if shape.parameters.is_none() {
                    shape.parameters = node.child_by_field_name("parameters");
                    if let Some(inner) = node.child_by_field_name("declarator") {
                        shape.is_function_pointer = Self::contains_pointer(inner);
                    }
                }
                if let Some(inner) = node.child_by_field_name("declarator") {
                    self.analyze_declarator(inner, source, shape);
                }
            }
            "parenthesized_declarator" | "array_declarator" | "attributed_declarator" => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.analyze_declarator(child, source, shape);
                }
            }
            "ms_call_modifier" => {
                shape.calling_convention = Some(Self::text(node, source).to_string());
            }
            _ => {
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    self.analyze_declarator(child, source, shape);
                }
            }
        }
    }

    /// 声明符子树里是否出现指针（不进入参数表）
    fn contains_pointer(node: Node) -> bool {
        if node.kind() == "pointer_declarator" {
            return true;
        }
        if node.kind() == "parameter_list" {
            return false;
        }
        let mut cursor = node.walk();
        node.named_children(&mut cursor).any(Self::contains_pointer)
    }
}

impl LanguageFrontend for CFrontend {
    fn extract_declarations(&mut self, source: &str) -> Result<Vec<RawDeclaration>> {
        let tree = self.parse_source(source)?;
        let root = tree.root_node();
        let mut declarations = Vec::new();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            self.extract_top_level(child, source, &mut declarations);
        }
        Ok(declarations)
    }

    fn language_name(&self) -> &'static str {
        "C"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["c", "h"]
    }
}
