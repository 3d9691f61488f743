//! Arena-indexed disjoint-set structure.
//!
//! Elements are plain indices into a caller-owned slice, so merging never
//! touches the records themselves.

/// Disjoint sets over `0..len` with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    /// Create `len` singleton sets.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Representative of the set containing `x`.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Merge the sets containing `a` and `b`.
    ///
    /// Returns `false` if they were already in the same set.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
        true
    }

    /// Sets with at least `min_size` elements.
    ///
    /// Each set is sorted ascending and the sets are ordered by their
    /// smallest element, independent of the order unions were applied in.
    pub fn sets(&mut self, min_size: usize) -> Vec<Vec<usize>> {
        let mut by_root: Vec<Vec<usize>> = vec![Vec::new(); self.len()];
        for x in 0..self.len() {
            let root = self.find(x);
            by_root[root].push(x);
        }
        let mut sets: Vec<Vec<usize>> = by_root
            .into_iter()
            .filter(|s| !s.is_empty() && s.len() >= min_size)
            .collect();
        sets.sort_by_key(|s| s[0]);
        sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons() {
        let mut uf = UnionFind::new(3);
        assert_eq!(uf.len(), 3);
        assert_ne!(uf.find(0), uf.find(1));
        assert!(uf.sets(2).is_empty());
        assert_eq!(uf.sets(1).len(), 3);
    }

    #[test]
    fn test_union_is_transitive() {
        let mut uf = UnionFind::new(5);
        assert!(uf.union(0, 1));
        assert!(uf.union(1, 2));
        assert!(!uf.union(0, 2));

        assert_eq!(uf.find(0), uf.find(2));
        assert_ne!(uf.find(0), uf.find(3));
        assert_eq!(uf.sets(2), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_sets_independent_of_union_order() {
        let mut forward = UnionFind::new(6);
        forward.union(0, 4);
        forward.union(4, 2);
        forward.union(5, 3);

        let mut backward = UnionFind::new(6);
        backward.union(3, 5);
        backward.union(2, 4);
        backward.union(4, 0);

        assert_eq!(forward.sets(2), backward.sets(2));
        assert_eq!(forward.sets(2), vec![vec![0, 2, 4], vec![3, 5]]);
    }

    #[test]
    fn test_empty() {
        let mut uf = UnionFind::new(0);
        assert!(uf.is_empty());
        assert!(uf.sets(1).is_empty());
    }
}
