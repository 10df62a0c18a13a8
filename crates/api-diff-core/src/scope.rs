//! 作用域限定名构建器
//!
//! 以栈的方式维护当前作用域的名称片段，拼接出声明的限定名。
//! 对基线和候选两次独立的规范化运行，同一声明必须得到相同的
//! 限定名 —— 这是差异引擎进行匹配的连接键

/// 作用域分隔符
pub const SCOPE_SEPARATOR: &str = "::";

/// 函数返回值伪成员的合成片段
pub const RETURN_TYPE_SEGMENT: &str = "(returnType)";

/// 无名值声明的合成片段前缀，后接其解析出的类型文本
pub const ANONYMOUS_VALUE_PREFIX: &str = "(anonymous::parameter)::";

/// 名称片段栈
#[derive(Debug, Default)]
pub struct ScopeTracker {
    segments: Vec<String>,
}

impl ScopeTracker {
    /// 创建空的作用域栈
    pub fn new() -> Self {
        Self::default()
    }

    /// 进入一个作用域片段
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// 为无名值声明进入一个合成片段
    ///
    /// 片段由固定字面量和解析出的类型文本组成，使得仅以匿名参数
    /// 类型区分的两个签名仍然拥有不同的限定名
    pub fn push_anonymous_value(&mut self, data_type: &str) {
        self.segments
            .push(format!("{ANONYMOUS_VALUE_PREFIX}{data_type}"));
    }

    /// 退出当前作用域片段
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// 当前限定名：所有片段按作用域分隔符拼接
    pub fn current_qualified_name(&self) -> String {
        self.segments.join(SCOPE_SEPARATOR)
    }

    /// 当前栈深度
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}
