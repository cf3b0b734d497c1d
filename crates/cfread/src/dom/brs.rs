// ABOUTME: Line-break cleanup for extracted statement and editorial HTML.
// ABOUTME: Replaces <br> outside preformatted blocks with a single space.

use dom_query::NodeRef;

use super::{inside_tag, replace_with_text, select_all};

/// Replace every `<br>` under `root` with a space text node, except those
/// inside one of `preformatted` (sample I/O keeps its line structure).
///
/// Returns the number of elements replaced.
pub fn replace_line_breaks<S: AsRef<str>>(root: &NodeRef, preformatted: &[S]) -> usize {
    let mut replaced = 0;
    for br in select_all(root, "br") {
        if inside_tag(&br, preformatted) {
            continue;
        }
        replace_with_text(&br, " ");
        replaced += 1;
    }
    replaced
}
