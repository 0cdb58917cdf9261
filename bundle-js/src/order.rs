//! Build order by depth relaxation over a dependency graph.
//!
//! Starting from the root at depth 0, every edge pushes its target to at least one deeper than
//! its source. Dependencies therefore end up deeper than everything depending on them, and
//! sorting by descending depth yields an order in which dependencies come first. In an acyclic
//! graph no depth can exceed the node count; once one does the graph has a cycle, which is then
//! located with a depth-first search so it can be reported.

use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;
use std::collections::VecDeque;
use std::hash::Hash;

/// Members of a cycle, starting and ending with the same node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cycle<K>(pub Vec<K>);

/// Orders the nodes reachable from `root` so that each node's dependencies precede it. Ties are
/// broken by discovery order. `limit` is the number of nodes in the graph.
pub fn depth_order<K, F>(root: K, limit: usize, edges: F) -> Result<Vec<K>, Cycle<K>>
where
  K: Clone + Eq + Hash,
  F: Fn(&K) -> Vec<K>,
{
  let mut depth: HashMap<K, usize> = HashMap::new();
  let mut discovered = vec![root.clone()];
  depth.insert(root.clone(), 0);
  let mut queue = VecDeque::from([root.clone()]);
  while let Some(node) = queue.pop_front() {
    let d = depth[&node];
    if d > limit {
      return Err(find_cycle(root, &edges).unwrap_or(Cycle(vec![node])));
    }
    for dep in edges(&node) {
      match depth.get_mut(&dep) {
        Some(existing) if *existing > d => continue,
        Some(existing) => *existing = d + 1,
        None => {
          depth.insert(dep.clone(), d + 1);
          discovered.push(dep.clone());
        }
      }
      // Only a raised depth needs to be pushed further down.
      queue.push_back(dep);
    }
  }
  let mut order = discovered;
  // Stable, so equal depths keep discovery order.
  order.sort_by_key(|k| std::cmp::Reverse(depth[k]));
  Ok(order)
}

/// First cycle reachable from `root`, if any.
pub fn find_cycle<K, F>(root: K, edges: &F) -> Option<Cycle<K>>
where
  K: Clone + Eq + Hash,
  F: Fn(&K) -> Vec<K>,
{
  let mut done: HashSet<K> = HashSet::new();
  let mut path: Vec<K> = Vec::new();
  // Each frame is a node and its remaining successors.
  let mut stack: Vec<(K, std::vec::IntoIter<K>)> = vec![(root.clone(), edges(&root).into_iter())];
  path.push(root);
  while let Some((_, successors)) = stack.last_mut() {
    match successors.next() {
      Some(next) => {
        if let Some(start) = path.iter().position(|k| *k == next) {
          let mut members = path[start..].to_vec();
          members.push(next);
          return Some(Cycle(members));
        }
        if done.contains(&next) {
          continue;
        }
        let successors = edges(&next).into_iter();
        path.push(next.clone());
        stack.push((next, successors));
      }
      None => {
        if let Some((node, _)) = stack.pop() {
          path.pop();
          done.insert(node);
        }
      }
    }
  }
  None
}
