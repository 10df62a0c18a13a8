//! 结构化差异引擎
//!
//! 对两个已完成的规范化上下文做两层对账：第一层按限定名递归
//! 匹配子树，第二层比较匹配节点对的标量字段（实现在 `node.rs`）。
//! 输出是一棵增量树：未变化的子树完全省略，报告中出现的每个
//! 限定名在其自身或之下至少有一处发现

use crate::context::NormalizedContext;
use crate::node::ApiNode;
use crate::token::{self, ADDED, MODIFIED, REMOVED, REORDERED};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// 字段级变更值：字符串令牌或布尔标志
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

/// 报告中的一个变更条目
///
/// 序列化形状即对外契约：`{tag, nodeType, qualifiedName, children?}`，
/// 字段级值条目额外按字段名平铺 removed/added 的取值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub tag: &'static str,
    #[serde(rename = "nodeType")]
    pub node_type: &'static str,
    #[serde(rename = "qualifiedName")]
    pub qualified_name: String,
    #[serde(flatten)]
    pub fields: BTreeMap<&'static str, FieldValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DiffEntry>,
}

impl DiffEntry {
    pub(crate) fn metadata(tag: &'static str, node: &ApiNode) -> Self {
        Self {
            tag,
            node_type: token::kind_token(node.kind),
            qualified_name: node.qualified_name.clone(),
            fields: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// 一个字段级值条目（第二层比较的 removed/added 侧）
    pub(crate) fn value_entry(
        node: &ApiNode,
        tag: &'static str,
        fields: BTreeMap<&'static str, FieldValue>,
    ) -> Self {
        Self {
            tag,
            node_type: token::kind_token(node.kind),
            qualified_name: node.qualified_name.clone(),
            fields,
            children: Vec::new(),
        }
    }
}

/// 两个快照上下文之间的差异引擎
///
/// 对账是两份只读上下文上的纯读取操作，只分配新的报告节点；
/// 匹配的根子树按限定名互不相交，因此逐根对账并行执行，
/// 结果按基线根顺序合并
pub struct DiffEngine<'a> {
    baseline: &'a NormalizedContext,
    candidate: &'a NormalizedContext,
}

impl<'a> DiffEngine<'a> {
    /// 创建差异引擎
    pub fn new(baseline: &'a NormalizedContext, candidate: &'a NormalizedContext) -> Self {
        Self {
            baseline,
            candidate,
        }
    }

    /// 对账两个上下文的根列表，产出有序的变更条目
    pub fn diff(&self) -> Vec<DiffEntry> {
        let baseline_roots = self.surviving(self.baseline.roots());
        let candidate_roots = self.surviving(self.candidate.roots());

        let baseline_names: HashSet<&str> = baseline_roots
            .iter()
            .map(|n| n.qualified_name.as_str())
            .collect();
        let candidate_by_name: HashMap<&str, &ApiNode> = candidate_roots
            .iter()
            .map(|n| (n.qualified_name.as_str(), *n))
            .collect();

        // 逐根并行对账，保持基线根顺序
        let mut entries: Vec<DiffEntry> = baseline_roots
            .par_iter()
            .map(|root| match candidate_by_name.get(root.qualified_name.as_str()) {
                Some(matched) => self.reconcile_pair(root, matched),
                None => vec![self.tagged_subtree(root, REMOVED)],
            })
            .flatten_iter()
            .collect();

        for root in &candidate_roots {
            if !baseline_names.contains(root.qualified_name.as_str()) {
                entries.push(self.tagged_subtree(root, ADDED));
            }
        }

        entries
    }

    /// 任一侧排除集中的限定名永不匹配、永不报告、永不被递归
    fn is_excluded(&self, qualified_name: &str) -> bool {
        self.baseline.is_excluded(qualified_name) || self.candidate.is_excluded(qualified_name)
    }

    fn surviving<'n>(&self, nodes: &'n [ApiNode]) -> Vec<&'n ApiNode> {
        nodes
            .iter()
            .filter(|n| !self.is_excluded(&n.qualified_name))
            .collect()
    }

    /// 第一层对账：一个层级上的两份同级节点列表
    fn reconcile_level(&self, baseline: &[ApiNode], candidate: &[ApiNode]) -> Vec<DiffEntry> {
        let baseline_nodes = self.surviving(baseline);
        let candidate_nodes = self.surviving(candidate);

        let baseline_names: HashSet<&str> = baseline_nodes
            .iter()
            .map(|n| n.qualified_name.as_str())
            .collect();
        let candidate_by_name: HashMap<&str, &ApiNode> = candidate_nodes
            .iter()
            .map(|n| (n.qualified_name.as_str(), *n))
            .collect();

        let mut entries = Vec::new();
        for node in &baseline_nodes {
            match candidate_by_name.get(node.qualified_name.as_str()) {
                Some(matched) => entries.extend(self.reconcile_pair(node, matched)),
                None => entries.push(self.tagged_subtree(node, REMOVED)),
            }
        }
        for node in &candidate_nodes {
            if !baseline_names.contains(node.qualified_name.as_str()) {
                entries.push(self.tagged_subtree(node, ADDED));
            }
        }
        entries
    }

    /// 对账一对按名匹配的节点：字段级差异包装为一个 MODIFIED 条目，
    /// 幸存子节点身份集相等但相对顺序不同时，在同层额外产出一个
    /// 独立的 REORDERED 条目
    fn reconcile_pair(&self, baseline: &ApiNode, candidate: &ApiNode) -> Vec<DiffEntry> {
        // 同名不同种类不是可对账的节点对，按整树移除加新增处理
        if baseline.kind != candidate.kind {
            return vec![
                self.tagged_subtree(baseline, REMOVED),
                self.tagged_subtree(candidate, ADDED),
            ];
        }

        let mut wrapped = baseline.field_change_entries(candidate);
        if baseline.is_composite() && candidate.is_composite() {
            wrapped.extend(self.reconcile_level(baseline.children(), candidate.children()));
        }

        let mut entries = Vec::new();
        if !wrapped.is_empty() {
            let mut modified = DiffEntry::metadata(MODIFIED, baseline);
            modified.children = wrapped;
            entries.push(modified);
        }

        if self.children_reordered(baseline, candidate) {
            entries.push(DiffEntry::metadata(REORDERED, baseline));
        }

        entries
    }

    fn children_reordered(&self, baseline: &ApiNode, candidate: &ApiNode) -> bool {
        if !baseline.is_composite() || !candidate.is_composite() {
            return false;
        }
        let baseline_order: Vec<&str> = self
            .surviving(baseline.children())
            .iter()
            .map(|n| n.qualified_name.as_str())
            .collect();
        let candidate_order: Vec<&str> = self
            .surviving(candidate.children())
            .iter()
            .map(|n| n.qualified_name.as_str())
            .collect();

        if baseline_order == candidate_order {
            return false;
        }
        let baseline_set: HashSet<&str> = baseline_order.iter().copied().collect();
        let candidate_set: HashSet<&str> = candidate_order.iter().copied().collect();
        baseline_set == candidate_set
    }

    /// 整棵子树以同一标签递归标记，每一层都带种类和限定名元数据
    fn tagged_subtree(&self, node: &ApiNode, tag: &'static str) -> DiffEntry {
        let mut entry = DiffEntry::metadata(tag, node);
        entry.children = node
            .children()
            .iter()
            .filter(|child| !self.is_excluded(&child.qualified_name))
            .map(|child| self.tagged_subtree(child, tag))
            .collect();
        entry
    }
}
