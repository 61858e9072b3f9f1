use std::ops::Range;
use std::sync::Arc;

use super::green::GreenNode;

fn same(a: &Arc<GreenNode>, b: &Arc<GreenNode>) -> bool {
    Arc::ptr_eq(a, b) || a == b
}

/// Walk both trees in step. Children lists of equal length are compared
/// pairwise; otherwise the common prefix and suffix are skipped and the
/// rest of the new children is reported as one range.
pub(super) fn changed_ranges(old: &Arc<GreenNode>, new: &Arc<GreenNode>) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut stack = vec![(old, new, 0usize)];

    while let Some((a, b, start)) = stack.pop() {
        if same(a, b) {
            continue;
        }
        let end = start + b.len;
        if a.symbol != b.symbol || a.children.is_empty() || b.children.is_empty() {
            ranges.push(start..end);
            continue;
        }

        if a.children.len() == b.children.len() {
            let mut offset = start;
            for (x, y) in a.children.iter().zip(&b.children) {
                stack.push((x, y, offset));
                offset += y.len;
            }
            continue;
        }

        let prefix = a
            .children
            .iter()
            .zip(&b.children)
            .take_while(|(x, y)| same(x, y))
            .count();
        let suffix = a.children[prefix..]
            .iter()
            .rev()
            .zip(b.children[prefix..].iter().rev())
            .take_while(|(x, y)| same(x, y))
            .count();
        let lo = start + b.children[..prefix].iter().map(|c| c.len).sum::<usize>();
        let hi = end
            - b.children[b.children.len() - suffix..]
                .iter()
                .map(|c| c.len)
                .sum::<usize>();
        if lo < hi {
            ranges.push(lo..hi);
        } else {
            ranges.push(start..end);
        }
    }

    merge(ranges)
}

fn merge(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}
