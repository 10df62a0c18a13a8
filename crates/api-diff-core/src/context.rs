//! 快照规范化上下文
//!
//! 每个快照对应一个 `NormalizedContext`：持有有序的根节点列表、
//! 顶层限定名索引（用于重复声明的幂等检查）和排除名集合。
//! 上下文在一次规范化运行中构建完成，之后只读

use crate::node::{ApiNode, NodeKind};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// 一个快照的规范化结果
#[derive(Debug, Default)]
pub struct NormalizedContext {
    /// 有序的顶层声明节点
    roots: Vec<ApiNode>,
    /// 顶层限定名到根节点种类的索引，只服务于顶层查询
    index: HashMap<String, NodeKind>,
    /// 永远不得出现在报告中的限定名（匿名/合成痕迹被折叠进其它声明）
    excluded: HashSet<String>,
}

impl NormalizedContext {
    /// 创建空上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个顶层节点
    ///
    /// 同名同种类的再次注册是 C 中前置声明/定义对的正常形态，
    /// 幂等地忽略；同名不同种类是内部错误
    pub fn add_root(&mut self, node: ApiNode) {
        if let Some(existing) = self.index.get(node.qualified_name.as_str()) {
            assert!(
                *existing == node.kind,
                "qualified name collision at top level: {} ({:?} vs {:?})",
                node.qualified_name,
                existing,
                node.kind
            );
            return;
        }
        self.index.insert(node.qualified_name.clone(), node.kind);
        self.roots.push(node);
    }

    /// 顶层是否已注册该限定名
    pub fn contains_root(&self, qualified_name: &str) -> bool {
        self.index.contains_key(qualified_name)
    }

    /// 顶层根节点的种类
    pub fn root_kind(&self, qualified_name: &str) -> Option<NodeKind> {
        self.index.get(qualified_name).copied()
    }

    /// 将限定名加入排除集
    pub fn exclude(&mut self, qualified_name: impl Into<String>) {
        self.excluded.insert(qualified_name.into());
    }

    /// 限定名是否被排除
    pub fn is_excluded(&self, qualified_name: &str) -> bool {
        self.excluded.contains(qualified_name)
    }

    /// 有序的根节点列表
    pub fn roots(&self) -> &[ApiNode] {
        &self.roots
    }

    /// 排除集大小
    pub fn excluded_len(&self) -> usize {
        self.excluded.len()
    }

    /// 合并另一个上下文（目录快照按路径顺序合并各编译单元）
    ///
    /// C 允许两个编译单元各自持有同名但不同种类的内部链接声明，
    /// 跨单元的种类冲突按路径顺序保留先到者并跳过后到者
    pub fn merge(&mut self, other: NormalizedContext) {
        for root in other.roots {
            if let Some(existing) = self.index.get(root.qualified_name.as_str())
                && *existing != root.kind
            {
                warn!(
                    qualified_name = %root.qualified_name,
                    kept = ?existing,
                    skipped = ?root.kind,
                    "cross-unit kind collision at top level, keeping the earlier declaration"
                );
                continue;
            }
            self.add_root(root);
        }
        self.excluded.extend(other.excluded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roots_preserve_insertion_order() {
        let mut ctx = NormalizedContext::new();
        ctx.add_root(ApiNode::new(NodeKind::Struct, "B"));
        ctx.add_root(ApiNode::new(NodeKind::Struct, "A"));
        let names: Vec<_> = ctx.roots().iter().map(|n| n.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_redeclaration_of_same_kind_is_idempotent() {
        let mut ctx = NormalizedContext::new();
        ctx.add_root(ApiNode::new(NodeKind::Function, "foo"));
        ctx.add_root(ApiNode::new(NodeKind::Function, "foo"));
        assert_eq!(ctx.roots().len(), 1);
        assert_eq!(ctx.root_kind("foo"), Some(NodeKind::Function));
    }

    #[test]
    #[should_panic(expected = "qualified name collision")]
    fn test_kind_collision_is_internal_error() {
        let mut ctx = NormalizedContext::new();
        ctx.add_root(ApiNode::new(NodeKind::Function, "foo"));
        ctx.add_root(ApiNode::new(NodeKind::Struct, "foo"));
    }

    #[test]
    fn test_exclusion_set_membership() {
        let mut ctx = NormalizedContext::new();
        ctx.exclude("Point");
        assert!(ctx.is_excluded("Point"));
        assert!(!ctx.is_excluded("Other"));
    }

    #[test]
    fn test_merge_combines_roots_and_exclusions() {
        let mut a = NormalizedContext::new();
        a.add_root(ApiNode::new(NodeKind::Struct, "S"));
        a.exclude("Hidden");

        let mut b = NormalizedContext::new();
        b.add_root(ApiNode::new(NodeKind::Function, "f"));
        b.add_root(ApiNode::new(NodeKind::Struct, "S"));
        b.exclude("Other");

        a.merge(b);
        assert_eq!(a.roots().len(), 2);
        assert!(a.is_excluded("Hidden"));
        assert!(a.is_excluded("Other"));
    }

    #[test]
    fn test_merge_keeps_first_kind_on_cross_unit_collision() {
        let mut a = NormalizedContext::new();
        a.add_root(ApiNode::new(NodeKind::Variable, "helper"));

        let mut b = NormalizedContext::new();
        b.add_root(ApiNode::new(NodeKind::Function, "helper"));

        a.merge(b);
        assert_eq!(a.roots().len(), 1);
        assert_eq!(a.root_kind("helper"), Some(NodeKind::Variable));
    }
}
