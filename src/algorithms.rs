// SPDX-License-Identifier: MIT
// Indel distance via bit-parallel LCS (Hyyrö), single- and multi-word.

use rustc_hash::FxHashMap;

pub trait HashableChar: Copy + Eq + std::hash::Hash {
    fn as_usize(&self) -> Option<usize>;
}
impl HashableChar for u8 {
    #[inline] fn as_usize(&self) -> Option<usize> { Some(*self as usize) }
}
impl HashableChar for u32 {
    #[inline] fn as_usize(&self) -> Option<usize> { if *self < 256 { Some(*self as usize) } else { None } }
}

/// Per-character match bitmask for patterns up to 64 units.
pub struct PatternMask64<T: HashableChar> {
    ascii: [u64; 256],
    fallback: FxHashMap<T, u64>,
}

impl<T: HashableChar> PatternMask64<T> {
    pub fn new(pattern: &[T]) -> Self {
        let mut pm = PatternMask64 { ascii: [0; 256], fallback: FxHashMap::default() };
        for (i, &c) in pattern.iter().enumerate() {
            let bit = 1u64 << i;
            match c.as_usize() {
                Some(idx) => pm.ascii[idx] |= bit,
                None => *pm.fallback.entry(c).or_insert(0) |= bit,
            }
        }
        pm
    }

    #[inline(always)]
    pub fn get(&self, c: T) -> u64 {
        match c.as_usize() {
            Some(idx) => self.ascii[idx],
            None => self.fallback.get(&c).copied().unwrap_or(0),
        }
    }
}

/// Same as [`PatternMask64`] but split across `words` 64-bit blocks.
pub struct PatternMaskMulti<T: HashableChar> {
    words: usize,
    ascii: Vec<u64>,
    fallback: FxHashMap<T, Vec<u64>>,
    zeros: Vec<u64>,
}

impl<T: HashableChar> PatternMaskMulti<T> {
    pub fn new(pattern: &[T]) -> Self {
        let words = pattern.len().div_ceil(64);
        let mut pm = PatternMaskMulti {
            words,
            ascii: vec![0u64; 256 * words],
            fallback: FxHashMap::default(),
            zeros: vec![0; words],
        };
        for (i, &c) in pattern.iter().enumerate() {
            let (word, bit) = (i / 64, 1u64 << (i % 64));
            match c.as_usize() {
                Some(idx) => pm.ascii[idx * words + word] |= bit,
                None => pm.fallback.entry(c).or_insert_with(|| vec![0u64; words])[word] |= bit,
            }
        }
        pm
    }

    #[inline(always)]
    pub fn get(&self, c: T) -> &[u64] {
        match c.as_usize() {
            Some(idx) => &self.ascii[idx * self.words..(idx + 1) * self.words],
            None => self.fallback.get(&c).map(|v| v.as_slice()).unwrap_or(&self.zeros),
        }
    }
}

#[inline]
pub fn common_prefix<T: HashableChar>(s1: &[T], s2: &[T]) -> usize {
    s1.iter().zip(s2.iter()).take_while(|(a, b)| a == b).count()
}

#[inline]
pub fn common_suffix<T: HashableChar>(s1: &[T], s2: &[T]) -> usize {
    s1.iter()
        .rev()
        .zip(s2.iter().rev())
        .take_while(|(a, b)| a == b)
        .count()
}

fn lcs_single_word<T: HashableChar>(pattern: &[T], text: &[T]) -> usize {
    let pm = PatternMask64::new(pattern);
    let mask = if pattern.len() == 64 { !0u64 } else { (1u64 << pattern.len()) - 1 };
    let mut v = !0u64;
    for &c in text {
        let x = pm.get(c);
        let u = v & x;
        v = v.wrapping_add(u) | (v & !x);
    }
    (!v & mask).count_ones() as usize
}

fn lcs_multi_word<T: HashableChar>(pattern: &[T], text: &[T]) -> usize {
    let pm = PatternMaskMulti::new(pattern);
    let words = pm.words;
    let mut v = vec![!0u64; words];
    let mut next = vec![0u64; words];
    let tail_bits = pattern.len() % 64;
    let tail_mask = if tail_bits == 0 { !0u64 } else { (1u64 << tail_bits) - 1 };

    for &c in text {
        let pm_c = pm.get(c);
        let mut carry = 0u64;
        for w in 0..words {
            let u = v[w] & pm_c[w];
            let sum = v[w] as u128 + u as u128 + carry as u128;
            carry = (sum >> 64) as u64;
            next[w] = (sum as u64) | (v[w] ^ u);
        }
        std::mem::swap(&mut v, &mut next);
    }

    let full: usize = v[..words - 1].iter().map(|w| (!w).count_ones() as usize).sum();
    full + (!v[words - 1] & tail_mask).count_ones() as usize
}

/// Length of the longest common subsequence. The shorter input becomes the
/// bit pattern.
pub fn lcs_length<T: HashableChar>(s1: &[T], s2: &[T]) -> usize {
    let (pattern, text) = if s1.len() <= s2.len() { (s1, s2) } else { (s2, s1) };
    if pattern.is_empty() {
        return 0;
    }
    if pattern.len() <= 64 {
        lcs_single_word(pattern, text)
    } else {
        lcs_multi_word(pattern, text)
    }
}

/// Insertions plus deletions needed to turn `s1` into `s2`.
pub fn indel_distance<T: HashableChar>(s1: &[T], s2: &[T]) -> usize {
    let pfx = common_prefix(s1, s2);
    let (s1, s2) = (&s1[pfx..], &s2[pfx..]);
    let sfx = common_suffix(s1, s2);
    let (s1, s2) = (&s1[..s1.len() - sfx], &s2[..s2.len() - sfx]);
    s1.len() + s2.len() - 2 * lcs_length(s1, s2)
}
