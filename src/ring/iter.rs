use std::iter::FusedIterator;
use std::slice;

/// 有効な要素を古い順にたどるイテレータ
///
/// 折り返し位置で分かれた 2 つの連続領域を順に走査する。
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    first: slice::Iter<'a, i32>,
    second: slice::Iter<'a, i32>,
}

impl<'a> Iter<'a> {
    pub(super) fn new(first: &'a [i32], second: &'a [i32]) -> Self {
        Self {
            first: first.iter(),
            second: second.iter(),
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a i32;

    fn next(&mut self) -> Option<Self::Item> {
        self.first.next().or_else(|| self.second.next())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.first.len() + self.second.len();
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.second.next_back().or_else(|| self.first.next_back())
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
