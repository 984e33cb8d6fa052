//! Line diff between the on-disk output and freshly generated output

/// Unchanged lines kept around each change
const CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit<'a> {
    Equal(&'a str),
    Delete(&'a str),
    Insert(&'a str),
}

impl Edit<'_> {
    fn is_change(&self) -> bool {
        !matches!(self, Edit::Equal(_))
    }
}

fn normalize(text: &str) -> &str {
    text.trim()
}

/// Compare two outputs after trimming surrounding whitespace.
///
/// Returns `None` when they are identical, otherwise unified-diff hunks
/// (`@@ -a,b +c,d @@` headers, ` `/`-`/`+` line prefixes).
pub fn diff(old: &str, new: &str) -> Option<String> {
    let old = normalize(old);
    let new = normalize(new);
    if old == new {
        return None;
    }

    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();
    let edits = edit_script(&old_lines, &new_lines);
    Some(render_hunks(&edits))
}

/// Shortest edit script; deletions are ordered before insertions within a
/// change.
///
/// The common prefix and suffix are matched directly. The remainder is split
/// recursively around the midpoint of a longest common subsequence, keeping
/// memory linear in the input size.
fn edit_script<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<Edit<'a>> {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let mut edits = Vec::with_capacity(old.len().max(new.len()));
    edits.extend(old[..prefix].iter().copied().map(Edit::Equal));
    split_changes(
        &old[prefix..old.len() - suffix],
        &new[prefix..new.len() - suffix],
        &mut edits,
    );
    edits.extend(old[old.len() - suffix..].iter().copied().map(Edit::Equal));

    order_changes(&mut edits);
    edits
}

fn split_changes<'a>(old: &[&'a str], new: &[&'a str], edits: &mut Vec<Edit<'a>>) {
    if old.is_empty() {
        edits.extend(new.iter().copied().map(Edit::Insert));
        return;
    }
    if new.is_empty() {
        edits.extend(old.iter().copied().map(Edit::Delete));
        return;
    }
    if let [line] = old {
        match new.iter().position(|candidate| candidate == line) {
            Some(at) => {
                edits.extend(new[..at].iter().copied().map(Edit::Insert));
                edits.push(Edit::Equal(line));
                edits.extend(new[at + 1..].iter().copied().map(Edit::Insert));
            }
            None => {
                edits.push(Edit::Delete(line));
                edits.extend(new.iter().copied().map(Edit::Insert));
            }
        }
        return;
    }

    let mid = old.len() / 2;
    let forward = lcs_lengths(&old[..mid], new, false);
    let backward = lcs_lengths(&old[mid..], new, true);
    let m = new.len();
    let split = (0..=m)
        .max_by_key(|&k| (forward[k] + backward[m - k], std::cmp::Reverse(k)))
        .unwrap_or(0);

    split_changes(&old[..mid], &new[..split], edits);
    split_changes(&old[mid..], &new[split..], edits);
}

/// Last row of the LCS table of `old` against each prefix of `new` (or each
/// suffix when `reverse` is set), using two rows of storage.
fn lcs_lengths(old: &[&str], new: &[&str], reverse: bool) -> Vec<usize> {
    let m = new.len();
    let mut prev = vec![0usize; m + 1];
    let mut cur = vec![0usize; m + 1];
    for i in 0..old.len() {
        let a = if reverse { old[old.len() - 1 - i] } else { old[i] };
        for j in 0..m {
            let b = if reverse { new[m - 1 - j] } else { new[j] };
            cur[j + 1] = if a == b {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev
}

/// Within each run of changes, move deletions ahead of insertions
fn order_changes(edits: &mut [Edit<'_>]) {
    for run in edits.split_mut(|edit| !edit.is_change()) {
        run.sort_by_key(|edit| matches!(edit, Edit::Insert(_)));
    }
}

fn render_hunks(edits: &[Edit<'_>]) -> String {
    // Lines of each side consumed before edit k
    let mut positions = Vec::with_capacity(edits.len() + 1);
    let (mut old_pos, mut new_pos) = (0usize, 0usize);
    for edit in edits {
        positions.push((old_pos, new_pos));
        match edit {
            Edit::Equal(_) => {
                old_pos += 1;
                new_pos += 1;
            }
            Edit::Delete(_) => old_pos += 1,
            Edit::Insert(_) => new_pos += 1,
        }
    }
    positions.push((old_pos, new_pos));

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (index, _) in edits.iter().enumerate().filter(|(_, e)| e.is_change()) {
        let start = index.saturating_sub(CONTEXT);
        let end = (index + CONTEXT + 1).min(edits.len());
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => ranges.push((start, end)),
        }
    }

    let mut out = String::new();
    for (start, end) in ranges {
        let (old_start, new_start) = positions[start];
        let (old_end, new_end) = positions[end];
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            hunk_range(old_start, old_end - old_start),
            hunk_range(new_start, new_end - new_start)
        ));
        for edit in &edits[start..end] {
            let (prefix, line) = match edit {
                Edit::Equal(line) => (' ', line),
                Edit::Delete(line) => ('-', line),
                Edit::Insert(line) => ('+', line),
            };
            out.push(prefix);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// `start,count` with a 1-based start; empty ranges point at the preceding line
fn hunk_range(start: usize, count: usize) -> String {
    if count == 0 {
        format!("{},0", start)
    } else {
        format!("{},{}", start + 1, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identical_inputs() {
        assert_eq!(diff("Foo\nBar\nBaz", "Foo\nBar\nBaz"), None);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(diff("Foo\nBar\n", "\nFoo\nBar\n\n\n"), None);
    }

    #[test]
    fn test_single_changed_line() {
        assert_eq!(
            diff("Foo\nBar\nBaz", "Foo\nQux\nBaz").as_deref(),
            Some("@@ -1,3 +1,3 @@\n Foo\n-Bar\n+Qux\n Baz\n")
        );
    }

    #[test]
    fn test_distant_changes_get_separate_hunks() {
        let old: Vec<String> = (1..=20).map(|n| n.to_string()).collect();
        let mut new = old.clone();
        new[1] = "two".into();
        new[17] = "eighteen".into();

        let output = diff(&old.join("\n"), &new.join("\n")).unwrap();
        let headers: Vec<&str> = output.lines().filter(|l| l.starts_with("@@")).collect();
        assert_eq!(headers, vec!["@@ -1,5 +1,5 @@", "@@ -15,6 +15,6 @@"]);
    }

    #[test]
    fn test_pure_insertion_at_end() {
        assert_eq!(
            diff("a", "a\nb").as_deref(),
            Some("@@ -1,1 +1,2 @@\n a\n+b\n")
        );
    }

    #[test]
    fn test_everything_replaced() {
        assert_eq!(
            diff("a", "b").as_deref(),
            Some("@@ -1,1 +1,1 @@\n-a\n+b\n")
        );
    }

    #[test]
    fn test_large_inputs_with_one_change() {
        let old: Vec<String> = (1..=20_000).map(|n| format!("line {}", n)).collect();
        let mut new = old.clone();
        new[9_999] = "changed".into();

        let output = diff(&old.join("\n"), &new.join("\n")).unwrap();
        assert_eq!(
            output,
            "@@ -9997,7 +9997,7 @@\n line 9997\n line 9998\n line 9999\n-line 10000\n+changed\n line 10001\n line 10002\n line 10003\n"
        );
    }

    #[test]
    fn test_interleaved_changes_keep_common_lines() {
        assert_eq!(
            diff("a\nb\nc\nd\ne", "x\nb\ny\nd\nz").as_deref(),
            Some("@@ -1,5 +1,5 @@\n-a\n+x\n b\n-c\n+y\n d\n-e\n+z\n")
        );
    }

    #[test]
    fn test_deletions_precede_insertions() {
        let edits = edit_script(&["a", "b", "c"], &["x", "a", "c", "y"]);
        assert_eq!(
            edits,
            vec![
                Edit::Insert("x"),
                Edit::Equal("a"),
                Edit::Delete("b"),
                Edit::Equal("c"),
                Edit::Insert("y"),
            ]
        );
    }
}
