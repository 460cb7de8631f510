//! Dependency ordering.
//!
//! Kahn's algorithm over node positions. Ready nodes are drawn from an
//! ordered set, so among nodes that are free to go next the lowest position
//! always wins and the result is fully deterministic.

use std::collections::BTreeSet;

/// Orders `0..len` so that every node follows all of its dependencies.
///
/// `deps_of(n)` yields the positions node `n` depends on. Duplicate edges are
/// tolerated. On a cycle the positions that could not be ordered are returned
/// as the error, in ascending order.
pub fn topological_sort<I>(
    len: usize,
    mut deps_of: impl FnMut(usize) -> I,
) -> Result<Vec<usize>, Vec<usize>>
where
    I: IntoIterator<Item = usize>,
{
    let mut in_degree = vec![0usize; len];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); len];

    for node in 0..len {
        for dep in deps_of(node) {
            debug_assert!(dep < len, "dependency {dep} out of range");
            if !dependents[dep].contains(&node) {
                dependents[dep].push(node);
                in_degree[node] += 1;
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..len).filter(|&n| in_degree[n] == 0).collect();
    let mut order = Vec::with_capacity(len);

    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &dependent in &dependents[node] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() == len {
        Ok(order)
    } else {
        Err((0..len).filter(|&n| in_degree[n] > 0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph() {
        assert_eq!(topological_sort(0, |_| Vec::new()), Ok(Vec::new()));
    }

    #[test]
    fn keeps_position_order_without_edges() {
        assert_eq!(topological_sort(3, |_| Vec::new()), Ok(vec![0, 1, 2]));
    }

    #[test]
    fn dependencies_come_first() {
        // 0 needs 2, 1 needs 0.
        let deps = [vec![2], vec![0], vec![]];
        let order = topological_sort(3, |n| deps[n].clone()).unwrap();
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[test]
    fn diamond() {
        // 3 needs 1 and 2, both need 0.
        let deps = [vec![], vec![0], vec![0, 0], vec![2, 1]];
        let order = topological_sort(4, |n| deps[n].clone()).unwrap();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn reports_cycle_members() {
        // 1 <-> 2, 3 hangs off the cycle, 0 is free.
        let deps = [vec![], vec![2], vec![1], vec![2]];
        let err = topological_sort(4, |n| deps[n].clone()).unwrap_err();
        assert_eq!(err, vec![1, 2, 3]);
    }
}
