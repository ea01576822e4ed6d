//! Terminal grid layout for lists of names.

use unicode_width::UnicodeWidthStr;

/// Terminal width assumed for column layout.
pub const TERMINAL_WIDTH: usize = 80;

/// Space left between columns.
const GUTTER: usize = 2;

/// Lays `items` out left-justified in as many columns as fit in `width`,
/// filling rows left to right. Returns `None` when only one column fits,
/// in which case the caller should print one item per line.
pub fn grid(items: &[String], width: usize) -> Option<String> {
    let cell = items.iter().map(|i| i.width()).max()? + GUTTER;
    let ncols = width / cell;
    if ncols < 2 {
        return None;
    }

    let mut out = String::new();
    for row in items.chunks(ncols) {
        let mut line = String::new();
        for item in row {
            line.push_str(item);
            line.extend(std::iter::repeat(' ').take(cell - item.width()));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    Some(out)
}
