//! The digraph algorithm of DeRemer and Pennello.
//!
//! Given a relation `R` over nodes `0..n` and an initial set `F'(x)` for each
//! node, computes
//!
//! ```text
//! F(x) = F'(x) \cup \bigcup { F(y) | x R+ y }
//! ```
//!
//! in a single depth-first traversal. Nodes of a strongly connected component
//! share the same result, which is copied from the component root.

use crate::util::get_two_mut;

pub trait Set {
    fn union_with(&mut self, other: &Self);
}

/// Solve the set equations for `relation`, updating `sets` in place.
///
/// `relation[x]` lists the successors `y` with `x R y`.
pub fn digraph<T>(relation: &[Vec<usize>], sets: &mut [T])
where
    T: Set + Clone,
{
    assert_eq!(relation.len(), sets.len());
    let n = sets.len();
    let mut solver = Digraph {
        relation,
        sets,
        index: vec![0; n],
        vertices: Vec::with_capacity(n),
        frames: vec![],
        infinity: n + 2,
    };
    for x in 0..n {
        if solver.index[x] == 0 && !relation[x].is_empty() {
            solver.traverse(x);
        }
    }
}

struct Frame {
    node: usize,
    height: usize,
    next_edge: usize,
}

struct Digraph<'a, T> {
    relation: &'a [Vec<usize>],
    sets: &'a mut [T],
    index: Vec<usize>,
    vertices: Vec<usize>,
    frames: Vec<Frame>,
    infinity: usize,
}

impl<T> Digraph<'_, T>
where
    T: Set + Clone,
{
    fn traverse(&mut self, root: usize) {
        let relation = self.relation;
        self.enter(root);

        while let Some(frame) = self.frames.last_mut() {
            let x = frame.node;
            match relation[x].get(frame.next_edge) {
                Some(&y) => {
                    frame.next_edge += 1;
                    if self.index[y] == 0 {
                        // The merge of F(y) into F(x) happens once y is finished.
                        self.enter(y);
                    } else {
                        self.merge(x, y);
                    }
                }
                None => {
                    let height = frame.height;
                    self.frames.pop();
                    self.leave(x, height);
                    if let Some(parent) = self.frames.last() {
                        let parent = parent.node;
                        self.merge(parent, x);
                    }
                }
            }
        }
    }

    fn enter(&mut self, x: usize) {
        self.vertices.push(x);
        let height = self.vertices.len();
        self.index[x] = height;
        self.frames.push(Frame {
            node: x,
            height,
            next_edge: 0,
        });
    }

    // F(x) <- F(x) \cup F(y)
    fn merge(&mut self, x: usize, y: usize) {
        if self.index[y] < self.index[x] {
            self.index[x] = self.index[y];
        }
        if x != y {
            let (slot, added) = get_two_mut(self.sets, x, y);
            slot.union_with(added);
        }
    }

    fn leave(&mut self, x: usize, height: usize) {
        if self.index[x] != height {
            return;
        }
        while let Some(s) = self.vertices.pop() {
            self.index[s] = self.infinity;
            if s == x {
                break;
            }
            // F(s) <- F(x)
            self.sets[s] = self.sets[x].clone();
        }
    }
}
