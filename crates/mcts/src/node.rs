//! MCTS search tree nodes.
//!
//! A node is either a [`SearchNode::Leaf`] (never visited) or
//! [`SearchNode::Expanded`], in which case it carries per-action statistics
//! and owns its children. Children are created explicitly on first
//! traversal and the tree is owned top-down, so promoting a child to be the
//! new root drops the old root and every sibling subtree.

use std::collections::BTreeMap;

/// One game state reached during search.
#[derive(Clone, Debug, Default)]
pub enum SearchNode {
    /// Not yet evaluated.
    #[default]
    Leaf,
    /// Evaluated once; statistics accumulate on every later visit.
    Expanded(Expanded),
}

/// Statistics of an expanded node, one entry per action index.
#[derive(Clone, Debug)]
pub struct Expanded {
    /// Estimator prior at expansion time. Fixed for the node's lifetime.
    prior: Vec<f32>,

    /// Legality mask at expansion time. Fixed for the node's lifetime.
    valid: Vec<bool>,

    /// Estimator value vector at expansion time, indexed by player.
    value: Vec<f32>,

    /// N(s, a)
    visits: Vec<u32>,

    /// W(s, a)
    total: Vec<f32>,

    /// Q(s, a) = W(s, a) / N(s, a), 0 while unvisited
    mean: Vec<f32>,

    /// P(s, a) / (1 + N(s, a))
    weight: Vec<f32>,

    /// Sum of all N(s, a)
    total_visits: u32,

    children: BTreeMap<usize, SearchNode>,
}

impl Expanded {
    pub fn prior(&self) -> &[f32] {
        &self.prior
    }

    pub fn valid(&self) -> &[bool] {
        &self.valid
    }

    /// Estimator value vector stored at expansion.
    pub fn value(&self) -> &[f32] {
        &self.value
    }

    pub fn visits(&self) -> &[u32] {
        &self.visits
    }

    pub fn total_value(&self) -> &[f32] {
        &self.total
    }

    pub fn mean_value(&self) -> &[f32] {
        &self.mean
    }

    pub fn exploration_weight(&self) -> &[f32] {
        &self.weight
    }

    pub fn total_visits(&self) -> u32 {
        self.total_visits
    }

    /// Existing child for `action`, if one was ever traversed.
    pub fn child(&self, action: usize) -> Option<&SearchNode> {
        self.children.get(&action)
    }

    /// Number of children created so far.
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// PUCT score of `action`. Illegal actions score `-inf`.
    pub fn score(&self, action: usize, c_puct: f32) -> f32 {
        if !self.valid[action] {
            return f32::NEG_INFINITY;
        }
        let sqrt_total = (self.total_visits as f32).sqrt();
        self.mean[action] + c_puct * sqrt_total * self.weight[action]
    }
}

impl SearchNode {
    /// A fresh, unexpanded node.
    pub fn new() -> Self {
        Self::Leaf
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        matches!(self, Self::Expanded(_))
    }

    /// Statistics of an expanded node.
    pub fn stats(&self) -> Option<&Expanded> {
        match self {
            Self::Expanded(stats) => Some(stats),
            Self::Leaf => None,
        }
    }

    fn expanded_mut(&mut self, op: &str) -> &mut Expanded {
        match self {
            Self::Expanded(stats) => stats,
            Self::Leaf => panic!("BUG: {} called on an unexpanded node", op),
        }
    }

    fn expanded_ref(&self, op: &str) -> &Expanded {
        match self {
            Self::Expanded(stats) => stats,
            Self::Leaf => panic!("BUG: {} called on an unexpanded node", op),
        }
    }

    /// Turn a leaf into an internal node with all statistics zeroed.
    ///
    /// # Panics
    /// Panics if the node is already expanded or if `prior` and `valid`
    /// differ in length.
    pub fn expand(&mut self, prior: Vec<f32>, value: Vec<f32>, valid: Vec<bool>) {
        assert!(!self.is_expanded(), "BUG: node expanded twice");
        assert_eq!(
            prior.len(),
            valid.len(),
            "BUG: prior and legality mask differ in length"
        );

        let n = prior.len();
        *self = Self::Expanded(Expanded {
            weight: prior.clone(),
            prior,
            valid,
            value,
            visits: vec![0; n],
            total: vec![0.0; n],
            mean: vec![0.0; n],
            total_visits: 0,
            children: BTreeMap::new(),
        });
    }

    /// Select the legal action with the highest PUCT score.
    ///
    /// score(a) = Q(a) + c_puct * sqrt(T) * P(a) / (1 + N(a))
    ///
    /// Illegal actions are excluded outright, whatever prior mass they
    /// carry. Ties go to the lowest action index.
    ///
    /// # Panics
    /// Panics on an unexpanded node or when no action is legal.
    pub fn select(&self, c_puct: f32) -> usize {
        let stats = self.expanded_ref("select");

        let mut best: Option<(usize, f32)> = None;
        for action in 0..stats.valid.len() {
            if !stats.valid[action] {
                continue;
            }
            let score = stats.score(action, c_puct);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((action, score)),
            }
        }

        best.map(|(action, _)| action)
            .expect("BUG: select called on a node without legal actions")
    }

    /// Child for `action`, created as a fresh leaf on first access.
    ///
    /// # Panics
    /// Panics on an unexpanded node.
    pub fn child(&mut self, action: usize) -> &mut SearchNode {
        self.expanded_mut("child")
            .children
            .entry(action)
            .or_insert_with(SearchNode::new)
    }

    /// Record one simulation's value for `action`.
    ///
    /// # Panics
    /// Panics on an unexpanded node.
    pub fn backup(&mut self, action: usize, value: f32) {
        let stats = self.expanded_mut("backup");
        stats.total_visits += 1;
        stats.visits[action] += 1;
        stats.total[action] += value;
        stats.mean[action] = stats.total[action] / stats.visits[action] as f32;
        stats.weight[action] = stats.prior[action] / (1.0 + stats.visits[action] as f32);
    }

    /// Per-action visit counts. All zero for a leaf of `num_actions` actions.
    pub fn visit_counts(&self, num_actions: usize) -> Vec<u32> {
        match self {
            Self::Expanded(stats) => stats.visits.clone(),
            Self::Leaf => vec![0; num_actions],
        }
    }

    /// Consume this node and return the subtree under `action`.
    ///
    /// Everything else (this node and all sibling subtrees) is dropped. An
    /// action that was never traversed yields a fresh leaf.
    pub fn into_child(self, action: usize) -> SearchNode {
        match self {
            Self::Expanded(mut stats) => stats.children.remove(&action).unwrap_or_default(),
            Self::Leaf => SearchNode::new(),
        }
    }
}
