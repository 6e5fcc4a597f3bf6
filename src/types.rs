// SPDX-License-Identifier: MIT
// Character sequences handed to the bit-parallel kernels.

/// A string viewed as a sequence of code units. ASCII text borrows its bytes,
/// anything else is widened to one `u32` per `char`.
#[derive(Clone, Debug)]
pub enum Seq<'a> {
    Ascii(&'a [u8]),
    Wide(Vec<u32>),
}

impl<'a> Seq<'a> {
    pub fn new(s: &'a str) -> Self {
        if s.is_ascii() {
            Seq::Ascii(s.as_bytes())
        } else {
            Seq::Wide(s.chars().map(|c| c as u32).collect())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Seq::Ascii(v) => v.len(),
            Seq::Wide(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Calls a kernel generic over `HashableChar` with two `Seq`s, widening the
/// ASCII side when the other one is wide.
macro_rules! dispatch_pair {
    ($func:path, $s1:expr, $s2:expr $(, $args:expr)*) => {
        match ($s1, $s2) {
            ($crate::types::Seq::Ascii(a), $crate::types::Seq::Ascii(b)) => $func(*a, *b $(, $args)*),
            ($crate::types::Seq::Ascii(a), $crate::types::Seq::Wide(b)) => {
                $func(&a.iter().map(|&x| x as u32).collect::<Vec<_>>(), b $(, $args)*)
            }
            ($crate::types::Seq::Wide(a), $crate::types::Seq::Ascii(b)) => {
                $func(a, &b.iter().map(|&x| x as u32).collect::<Vec<_>>() $(, $args)*)
            }
            ($crate::types::Seq::Wide(a), $crate::types::Seq::Wide(b)) => $func(a, b $(, $args)*),
        }
    };
}
pub(crate) use dispatch_pair;
