//! Edit-distance matching for "did you mean" suggestions.

/// Levenshtein distance with unit cost for insertion, deletion and
/// substitution. Operates on chars, not bytes.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut d = vec![vec![0; b.len() + 1]; a.len() + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, val) in d[0].iter_mut().enumerate() {
        *val = j;
    }

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            d[i + 1][j + 1] = (d[i][j + 1] + 1).min(d[i + 1][j] + 1).min(d[i][j] + cost);
        }
    }

    d[a.len()][b.len()]
}

/// Every candidate within `threshold` edits of `query`, in input order.
pub fn find_close<'a, S: AsRef<str>>(candidates: &'a [S], query: &str, threshold: usize) -> Vec<&'a str> {
    candidates
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| edit_distance(c, query) <= threshold)
        .collect()
}
