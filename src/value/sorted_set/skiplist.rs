//! # Skiplist
//!
//! Ordered by `(score, member)`, with per-level forward pointers carrying a
//! span so rank queries run in O(log n) instead of a full scan.
use bytes::Bytes;
use float_ord::FloatOrd;
use rand::Rng;

const MAX_LEVEL: usize = 16;
const PROBABILITY: f64 = 0.25;

/// A single `(member, score)` pair stored in the list.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// The member.
    pub member: Bytes,
    /// Its score.
    pub score: f64,
}

#[derive(Debug)]
struct Level {
    forward: Option<usize>,
    span: u64,
}

#[derive(Debug)]
struct Node {
    element: Option<Element>,
    backward: Option<usize>,
    levels: Vec<Level>,
}

/// A skiplist of `(member, score)` pairs ordered by score, ties broken by
/// member.
#[derive(Debug)]
pub struct Skiplist {
    nodes: Vec<Node>,
    header: usize,
    tail: Option<usize>,
    level: usize,
    length: usize,
}

fn less(a_score: f64, a_member: &[u8], b_score: f64, b_member: &[u8]) -> bool {
    FloatOrd(a_score) < FloatOrd(b_score)
        || (a_score == b_score && a_member < b_member)
}

impl Skiplist {
    /// Creates an empty skiplist.
    pub fn new() -> Self {
        let header = Node {
            element: None,
            backward: None,
            levels: (0..MAX_LEVEL)
                .map(|_| Level {
                    forward: None,
                    span: 0,
                })
                .collect(),
        };
        Self {
            nodes: vec![header],
            header: 0,
            tail: None,
            level: 1,
            length: 0,
        }
    }

    /// Number of elements in the list.
    pub fn len(&self) -> usize {
        self.length
    }

    fn random_level() -> usize {
        let mut level = 1;
        let mut rng = rand::thread_rng();
        while level < MAX_LEVEL && rng.gen::<f64>() < PROBABILITY {
            level += 1;
        }
        level
    }

    /// Inserts a new `(member, score)` pair. The caller must ensure the
    /// member is not already present (callers update by removing first).
    pub fn insert(&mut self, member: Bytes, score: f64) {
        let mut update = [self.header; MAX_LEVEL];
        let mut rank = [0u64; MAX_LEVEL];
        let mut cur = self.header;

        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.nodes[cur].levels[i].forward {
                let next_elem = self.nodes[next].element.as_ref().unwrap();
                if less(next_elem.score, &next_elem.member, score, &member) {
                    rank[i] += self.nodes[cur].levels[i].span;
                    cur = next;
                } else {
                    break;
                }
            }
            update[i] = cur;
        }

        let new_level = Self::random_level();
        if new_level > self.level {
            for i in self.level..new_level {
                update[i] = self.header;
                self.nodes[self.header].levels[i].span = self.length as u64;
            }
            self.level = new_level;
        }

        let new_idx = self.nodes.len();
        self.nodes.push(Node {
            element: Some(Element {
                member,
                score,
            }),
            backward: None,
            levels: (0..new_level)
                .map(|_| Level {
                    forward: None,
                    span: 0,
                })
                .collect(),
        });

        for i in 0..new_level {
            let prev = update[i];
            self.nodes[new_idx].levels[i].forward = self.nodes[prev].levels[i].forward;
            self.nodes[prev].levels[i].forward = Some(new_idx);

            self.nodes[new_idx].levels[i].span = self.nodes[prev].levels[i].span - (rank[0] - rank[i]);
            self.nodes[prev].levels[i].span = (rank[0] - rank[i]) + 1;
        }

        for i in new_level..self.level {
            self.nodes[update[i]].levels[i].span += 1;
        }

        let backward = if update[0] == self.header {
            None
        } else {
            Some(update[0])
        };
        self.nodes[new_idx].backward = backward;

        if let Some(next) = self.nodes[new_idx].levels[0].forward {
            self.nodes[next].backward = Some(new_idx);
        } else {
            self.tail = Some(new_idx);
        }

        self.length += 1;
    }

    /// Removes the `(member, score)` pair. Returns true if it was present.
    pub fn remove(&mut self, member: &[u8], score: f64) -> bool {
        let mut update = [self.header; MAX_LEVEL];
        let mut cur = self.header;

        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[cur].levels[i].forward {
                let next_elem = self.nodes[next].element.as_ref().unwrap();
                if less(next_elem.score, &next_elem.member, score, member) {
                    cur = next;
                } else {
                    break;
                }
            }
            update[i] = cur;
        }

        let target = self.nodes[cur].levels[0].forward;
        let target = match target {
            Some(t)
                if self.nodes[t].element.as_ref().unwrap().member.as_ref() == member =>
            {
                t
            }
            _ => return false,
        };

        for i in 0..self.level {
            if update[i] != self.header || self.nodes[update[i]].levels.len() > i {
                if self.nodes[update[i]].levels[i].forward == Some(target) {
                    let span = self.nodes[update[i]].levels[i].span as i64
                        + self.nodes[target].levels[i].span as i64
                        - 1;
                    self.nodes[update[i]].levels[i].span = span as u64;
                    self.nodes[update[i]].levels[i].forward = self.nodes[target].levels[i].forward;
                } else {
                    self.nodes[update[i]].levels[i].span -= 1;
                }
            }
        }

        if let Some(next) = self.nodes[target].levels[0].forward {
            self.nodes[next].backward = self.nodes[target].backward;
        } else {
            self.tail = self.nodes[target].backward;
        }

        while self.level > 1 && self.nodes[self.header].levels[self.level - 1].forward.is_none() {
            self.level -= 1;
        }

        self.length -= 1;
        true
    }

    /// 0-based ascending rank of `member` at `score`, or `None` if absent.
    pub fn rank(&self, member: &[u8], score: f64) -> Option<usize> {
        let mut rank = 0u64;
        let mut cur = self.header;

        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[cur].levels[i].forward {
                let e = self.nodes[next].element.as_ref().unwrap();
                if FloatOrd(e.score) < FloatOrd(score)
                    || (e.score == score && e.member.as_ref() <= member)
                {
                    rank += self.nodes[cur].levels[i].span;
                    cur = next;
                } else {
                    break;
                }
            }
        }

        if cur != self.header {
            let e = self.nodes[cur].element.as_ref().unwrap();
            if e.member.as_ref() == member && e.score == score {
                return Some((rank - 1) as usize);
            }
        }
        None
    }

    /// Returns the element at the given 0-based rank.
    pub fn by_rank(&self, rank: usize) -> Option<&Element> {
        let mut traversed = 0u64;
        let mut cur = self.header;
        let target = rank as u64 + 1;

        for i in (0..self.level).rev() {
            while let Some(next) = self.nodes[cur].levels[i].forward {
                if traversed + self.nodes[cur].levels[i].span <= target {
                    traversed += self.nodes[cur].levels[i].span;
                    cur = next;
                } else {
                    break;
                }
            }
            if traversed == target {
                return self.nodes[cur].element.as_ref();
            }
        }
        None
    }

    /// Iterates elements in ascending order.
    pub fn iter(&self) -> SkiplistIter<'_> {
        SkiplistIter {
            list: self,
            cur: self.nodes[self.header].levels[0].forward,
        }
    }
}

impl Default for Skiplist {
    fn default() -> Self {
        Self::new()
    }
}

/// Ascending iterator over a [`Skiplist`]'s elements.
pub struct SkiplistIter<'a> {
    list: &'a Skiplist,
    cur: Option<usize>,
}

impl<'a> Iterator for SkiplistIter<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.cur?;
        self.cur = self.list.nodes[cur].levels[0].forward;
        self.list.nodes[cur].element.as_ref()
    }
}
