use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::iter::Iter;

/// RingBuffer の操作エラー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// 有効範囲外のアクセス（空バッファの front/back を含む）
    #[error("Index out of range: {index} (len {len})")]
    OutOfRange { index: usize, len: usize },
    /// 満杯のバッファへの書き込みを拒否した
    #[error("Buffer is full (capacity {capacity})")]
    CapacityViolation { capacity: usize },
}

/// 固定容量のリングバッファ（i32 要素）
///
/// `head == tail` は空と満杯の両方で起こるため、判定は常に `count` で行う。
/// 容量は常に 1 以上（0 を指定すると 1 に補正される）。
#[derive(Clone)]
pub struct RingBuffer {
    buf: Box<[i32]>,
    /// 次に書き込む位置
    head: usize,
    /// 最も古い要素の位置（count > 0 のときのみ有効）
    tail: usize,
    count: usize,
}

impl RingBuffer {
    /// 空のバッファを作成
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(1)].into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// 全スロットを `value` で埋めた満杯のバッファを作成
    pub fn with_value(capacity: usize, value: i32) -> Self {
        let buf = vec![value; capacity.max(1)].into_boxed_slice();
        let count = buf.len();
        Self {
            buf,
            head: 0,
            tail: 0,
            count,
        }
    }

    /// 要素列から満杯のバッファを作成（容量 = 要素数）
    ///
    /// 空の列は `RingBuffer::new(1)` と同じ。
    pub fn from_slice(elements: &[i32]) -> Self {
        if elements.is_empty() {
            return Self::new(1);
        }
        Self {
            buf: elements.into(),
            head: 0,
            tail: 0,
            count: elements.len(),
        }
    }

    /// 末尾に追加する。満杯なら最も古い要素を上書きし、その値を返す
    pub fn push(&mut self, value: i32) -> Option<i32> {
        let cap = self.buf.len();
        let evicted = if self.count == cap {
            // 満杯時は head == tail なので書き込み前に退避する
            let oldest = self.buf[self.tail];
            self.tail = (self.tail + 1) % cap;
            Some(oldest)
        } else {
            self.count += 1;
            None
        };
        self.buf[self.head] = value;
        self.head = (self.head + 1) % cap;
        evicted
    }

    /// 満杯でなければ追加して true、満杯なら何も変更せず false
    pub fn try_push(&mut self, value: i32) -> bool {
        self.push_checked(value).is_ok()
    }

    /// `try_push` と同じだが、拒否を `CapacityViolation` として返す
    pub fn push_checked(&mut self, value: i32) -> Result<(), RingError> {
        if self.is_full() {
            return Err(RingError::CapacityViolation {
                capacity: self.capacity(),
            });
        }
        self.push(value);
        Ok(())
    }

    /// 最も古い要素を捨てる。空なら何もしない
    pub fn pop(&mut self) {
        self.try_pop();
    }

    /// 最も古い要素を取り出す
    pub fn try_pop(&mut self) -> Option<i32> {
        if self.count == 0 {
            return None;
        }
        let value = self.buf[self.tail];
        self.tail = (self.tail + 1) % self.buf.len();
        self.count -= 1;
        Some(value)
    }

    /// 最も新しい要素
    pub fn front(&self) -> Result<&i32, RingError> {
        let slot = self.newest_slot()?;
        Ok(&self.buf[slot])
    }

    pub fn front_mut(&mut self) -> Result<&mut i32, RingError> {
        let slot = self.newest_slot()?;
        Ok(&mut self.buf[slot])
    }

    /// 最も古い要素（次に pop される要素）
    pub fn back(&self) -> Result<&i32, RingError> {
        let slot = self.slot(0)?;
        Ok(&self.buf[slot])
    }

    pub fn back_mut(&mut self) -> Result<&mut i32, RingError> {
        let slot = self.slot(0)?;
        Ok(&mut self.buf[slot])
    }

    /// 論理インデックスでアクセス（0 が最も古い要素）
    pub fn get(&self, index: usize) -> Result<&i32, RingError> {
        let slot = self.slot(index)?;
        Ok(&self.buf[slot])
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut i32, RingError> {
        let slot = self.slot(index)?;
        Ok(&mut self.buf[slot])
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// 論理的に空にする（確保済みの領域は解放しない）
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// 容量を変更する
    ///
    /// 古い順に `min(len, new_capacity)` 個を残し、インデックス 0 から詰め直す。
    /// 縮小で溢れた新しい側の要素は破棄される。
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(1);
        if new_capacity == self.buf.len() {
            return;
        }

        let kept = self.count.min(new_capacity);
        if kept < self.count {
            tracing::debug!(
                "Ring buffer shrink {} -> {} drops {} element(s)",
                self.buf.len(),
                new_capacity,
                self.count - kept
            );
        }

        let mut buf = vec![0; new_capacity].into_boxed_slice();
        for (slot, value) in buf.iter_mut().zip(self.iter()) {
            *slot = *value;
        }

        self.buf = buf;
        self.tail = 0;
        self.head = kept % new_capacity;
        self.count = kept;
    }

    /// 有効な要素を古い順に 2 つの連続領域として返す
    pub fn as_slices(&self) -> (&[i32], &[i32]) {
        let cap = self.buf.len();
        let first_len = (cap - self.tail).min(self.count);
        (
            &self.buf[self.tail..self.tail + first_len],
            &self.buf[..self.count - first_len],
        )
    }

    /// バッファ内のデータを古い順に返す
    pub fn to_vec(&self) -> Vec<i32> {
        let (first, second) = self.as_slices();
        let mut result = Vec::with_capacity(self.count);
        // 2 スライスコピー: リングバッファの連続領域を直接 extend
        result.extend_from_slice(first);
        result.extend_from_slice(second);
        result
    }

    pub fn iter(&self) -> Iter<'_> {
        let (first, second) = self.as_slices();
        Iter::new(first, second)
    }

    fn slot(&self, index: usize) -> Result<usize, RingError> {
        if index >= self.count {
            return Err(RingError::OutOfRange {
                index,
                len: self.count,
            });
        }
        Ok((self.tail + index) % self.buf.len())
    }

    fn newest_slot(&self) -> Result<usize, RingError> {
        if self.count == 0 {
            return Err(RingError::OutOfRange { index: 0, len: 0 });
        }
        let cap = self.buf.len();
        Ok((self.head + cap - 1) % cap)
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.count)
            .field("elements", &self.to_vec())
            .finish()
    }
}

/// 容量と有効な要素列が一致すれば等しい（内部の head/tail 位置は問わない）
impl PartialEq for RingBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.capacity() == other.capacity() && self.iter().eq(other.iter())
    }
}

impl Eq for RingBuffer {}

impl From<Vec<i32>> for RingBuffer {
    fn from(elements: Vec<i32>) -> Self {
        if elements.is_empty() {
            return Self::new(1);
        }
        let count = elements.len();
        Self {
            buf: elements.into_boxed_slice(),
            head: 0,
            tail: 0,
            count,
        }
    }
}

impl FromIterator<i32> for RingBuffer {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

/// `push` と同じく、満杯なら古い要素を上書きする
impl Extend<i32> for RingBuffer {
    fn extend<I: IntoIterator<Item = i32>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<'a> IntoIterator for &'a RingBuffer {
    type Item = &'a i32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Index<usize> for RingBuffer {
    type Output = i32;

    fn index(&self, index: usize) -> &i32 {
        match self.get(index) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}

impl IndexMut<usize> for RingBuffer {
    fn index_mut(&mut self, index: usize) -> &mut i32 {
        match self.get_mut(index) {
            Ok(value) => value,
            Err(e) => panic!("{e}"),
        }
    }
}

/// シリアライズ形式: 容量と有効な要素列（古い順）
#[derive(Serialize, Deserialize)]
struct Snapshot {
    capacity: usize,
    elements: Vec<i32>,
}

impl Serialize for RingBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Snapshot {
            capacity: self.capacity(),
            elements: self.to_vec(),
        }
        .serialize(serializer)
    }
}

/// 容量を復元してから要素を積み直す。容量を超える要素列はエラー
impl<'de> Deserialize<'de> for RingBuffer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error as _;

        let snapshot = Snapshot::deserialize(deserializer)?;
        let mut buf = Self::new(snapshot.capacity);
        for value in snapshot.elements {
            buf.push_checked(value).map_err(D::Error::custom)?;
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(buf: &RingBuffer) {
        let cap = buf.capacity();
        assert!(cap >= 1);
        assert!(buf.head < cap);
        assert!(buf.tail < cap);
        assert!(buf.count <= cap);
        assert_eq!(buf.head, (buf.tail + buf.count) % cap);
        assert!(!(buf.is_empty() && buf.is_full()));
    }

    #[test]
    fn empty_buffer() {
        let buf = RingBuffer::new(64);
        assert!(buf.to_vec().is_empty());
        assert!(buf.is_empty());
        assert!(!buf.is_full());
        assert_invariants(&buf);
    }

    #[test]
    fn simple_push_read() {
        let mut buf = RingBuffer::new(8);
        buf.push(1);
        buf.push(2);
        buf.push(3);
        assert_eq!(buf.to_vec(), vec![1, 2, 3]);
        assert_invariants(&buf);
    }

    #[test]
    fn wrap_around() {
        let mut buf = RingBuffer::new(4);
        buf.extend([1, 2, 3, 4]); // 満杯
        assert_eq!(buf.push(5), Some(1)); // 先頭を上書き
        assert_eq!(buf.push(6), Some(2));
        assert_eq!(buf.to_vec(), vec![3, 4, 5, 6]);
        let (first, second) = buf.as_slices();
        assert_eq!(first, &[3, 4]);
        assert_eq!(second, &[5, 6]);
        assert_invariants(&buf);
    }

    #[test]
    fn overwrite_multiple_times() {
        let mut buf = RingBuffer::new(4);
        buf.extend(1..=6);
        assert_eq!(buf.to_vec(), vec![3, 4, 5, 6]);
        buf.extend([7, 8]);
        assert_eq!(buf.to_vec(), vec![5, 6, 7, 8]);
        assert_eq!(buf.len(), 4);
        assert_invariants(&buf);
    }

    #[test]
    fn zero_capacity_is_coerced_to_one() {
        let mut buf = RingBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
        buf.push(7);
        buf.push(8);
        assert_eq!(buf.to_vec(), vec![8]);
        assert_invariants(&buf);

        let filled = RingBuffer::with_value(0, 3);
        assert_eq!(filled.capacity(), 1);
        assert_eq!(filled.to_vec(), vec![3]);
        assert_invariants(&filled);
    }

    #[test]
    fn with_value_starts_full() {
        let buf = RingBuffer::with_value(3, 9);
        assert!(buf.is_full());
        assert_eq!(buf.to_vec(), vec![9, 9, 9]);
        assert_eq!(buf.head, 0);
        assert_eq!(buf.tail, 0);
        assert_invariants(&buf);
    }

    #[test]
    fn from_slice_and_empty_slice() {
        let buf = RingBuffer::from_slice(&[4, 5, 6]);
        assert_eq!(buf.capacity(), 3);
        assert!(buf.is_full());
        assert_eq!(buf.front(), Ok(&6));
        assert_eq!(buf.back(), Ok(&4));
        assert_invariants(&buf);

        let empty = RingBuffer::from_slice(&[]);
        assert_eq!(empty.capacity(), 1);
        assert!(empty.is_empty());
        assert_invariants(&empty);
    }

    #[test]
    fn pop_on_empty_is_noop() {
        let mut buf = RingBuffer::new(2);
        buf.pop();
        buf.pop();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.try_pop(), None);
        assert_invariants(&buf);
    }

    #[test]
    fn try_push_rejects_without_mutation() {
        let mut buf = RingBuffer::from_slice(&[1, 2]);
        let before = (buf.head, buf.tail, buf.count, buf.to_vec());
        assert!(!buf.try_push(3));
        assert_eq!((buf.head, buf.tail, buf.count, buf.to_vec()), before);
        assert_eq!(
            buf.push_checked(3),
            Err(RingError::CapacityViolation { capacity: 2 })
        );
    }

    #[test]
    fn front_is_newest_across_wrap() {
        let mut buf = RingBuffer::new(3);
        buf.extend([1, 2, 3]);
        assert_eq!(buf.head, 0);
        assert_eq!(buf.front(), Ok(&3));
        *buf.front_mut().unwrap() = 30;
        *buf.back_mut().unwrap() = 10;
        assert_eq!(buf.to_vec(), vec![10, 2, 30]);
    }

    #[test]
    fn get_is_bounded_by_len_not_capacity() {
        let mut buf = RingBuffer::new(8);
        buf.extend([1, 2]);
        assert_eq!(buf.get(1), Ok(&2));
        assert_eq!(buf.get(2), Err(RingError::OutOfRange { index: 2, len: 2 }));
        assert_eq!(buf.get(7), Err(RingError::OutOfRange { index: 7, len: 2 }));
    }

    #[test]
    #[should_panic(expected = "Index out of range: 3 (len 3)")]
    fn index_past_len_panics() {
        let buf = RingBuffer::from_slice(&[1, 2, 3]);
        let _value = buf[3];
    }

    #[test]
    fn resize_reanchors_at_zero() {
        let mut buf = RingBuffer::new(4);
        buf.extend([1, 2, 3, 4, 5, 6]);
        assert_ne!(buf.tail, 0);
        buf.resize(6);
        assert_eq!(buf.tail, 0);
        assert_eq!(buf.head, 4);
        assert_eq!(buf.to_vec(), vec![3, 4, 5, 6]);
        assert_invariants(&buf);

        buf.resize(2);
        assert_eq!(buf.to_vec(), vec![3, 4]);
        assert_eq!(buf.head, 0);
        assert!(buf.is_full());
        assert_invariants(&buf);
    }

    #[test]
    fn resize_zero_and_same_capacity() {
        let mut buf = RingBuffer::from_slice(&[5, 6]);
        buf.resize(2);
        assert_eq!(buf.to_vec(), vec![5, 6]);
        buf.resize(0);
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.to_vec(), vec![5]);
        assert_invariants(&buf);

        let mut empty = RingBuffer::new(3);
        empty.resize(5);
        assert!(empty.is_empty());
        assert_invariants(&empty);
    }

    #[test]
    fn iter_both_ends() {
        let mut buf = RingBuffer::new(3);
        buf.extend([1, 2, 3, 4]);
        let mut iter = buf.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.len(), 1);
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next(), None);
        assert_eq!(buf.iter().rev().copied().collect::<Vec<_>>(), vec![4, 3, 2]);
    }

    #[test]
    fn equality_ignores_internal_offsets() {
        let mut a = RingBuffer::new(3);
        a.extend([0, 1, 2, 3]);
        let b = RingBuffer::from_slice(&[1, 2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, RingBuffer::new(3));
    }

    #[test]
    fn serde_keeps_capacity_and_order() {
        let mut buf = RingBuffer::new(3);
        buf.extend([1, 2, 3, 4]);
        let json = serde_json::to_string(&buf).unwrap();
        assert_eq!(json, r#"{"capacity":3,"elements":[2,3,4]}"#);
        let back: RingBuffer = serde_json::from_str(&json).unwrap();
        assert_eq!(back, buf);
    }

    #[test]
    fn serde_partial_buffer_keeps_capacity() {
        let mut buf = RingBuffer::new(5);
        buf.extend([1, 2]);
        let json = serde_json::to_string(&buf).unwrap();
        let back: RingBuffer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.capacity(), 5);
        assert_eq!(back.to_vec(), vec![1, 2]);
        assert_eq!(back, buf);
        assert_invariants(&back);
    }

    #[test]
    fn deserialize_rejects_elements_past_capacity() {
        let result = serde_json::from_str::<RingBuffer>(r#"{"capacity":2,"elements":[1,2,3]}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Buffer is full (capacity 2)"));
    }
}
