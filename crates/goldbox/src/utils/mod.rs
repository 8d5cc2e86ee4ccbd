mod lines;

pub use lines::Line;
pub use lines::LinesWithTerminator;

/// Compare names so that embedded numbers order by value
///
/// `case2` sorts before `case10`.  Ties between numerically-equal runs (`01` vs `1`) and
/// otherwise equal names fall back to a byte-wise comparison so the order is total.
pub fn natural_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let mut left = a.as_bytes();
    let mut right = b.as_bytes();
    loop {
        match (left.first(), right.first()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let (l_num, l_rest) = split_digits(left);
                let (r_num, r_rest) = split_digits(right);
                let ordering = cmp_digits(l_num, r_num);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left = l_rest;
                right = r_rest;
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(r);
                }
                left = &left[1..];
                right = &right[1..];
            }
        }
    }
}

fn split_digits(s: &[u8]) -> (&[u8], &[u8]) {
    let end = s.iter().position(|b| !b.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn cmp_digits(a: &[u8], b: &[u8]) -> std::cmp::Ordering {
    let trim = |s: &[u8]| -> usize { s.iter().position(|&b| b != b'0').unwrap_or(s.len()) };
    let a = &a[trim(a)..];
    let b = &b[trim(b)..];
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
