use log::debug;

/// A single comma-separated piece of a range expression, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRangeToken {
    Single(u32),
    Span { start: u32, end: u32 },
}

impl PageRangeToken {
    /// Parse one token like "7" or "2-9". Each number is read from its leading digits,
    /// so "5abc" is page 5 and "1-2-3" is the span 1-2. Returns `None` when a side has
    /// no leading digits.
    pub fn parse(s: &str) -> Option<Self> {
        if s.contains('-') {
            let mut sides = s.split('-');
            let start = leading_number(sides.next()?)?;
            let end = leading_number(sides.next()?)?;
            Some(PageRangeToken::Span { start, end })
        } else {
            leading_number(s).map(PageRangeToken::Single)
        }
    }

    /// Expand into 1-based pages, or `None` if the token is inverted or falls outside
    /// `1..=total_pages`.
    pub fn expand(&self, total_pages: u32) -> Option<std::ops::RangeInclusive<u32>> {
        let (start, end) = match *self {
            PageRangeToken::Single(page) => (page, page),
            PageRangeToken::Span { start, end } => (start, end),
        };

        if start == 0 || start > end || end > total_pages {
            return None;
        }

        Some(start..=end)
    }
}

/// The number spelled by the leading digits of `s`, ignoring surrounding whitespace
/// and a leading `+`.
fn leading_number(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    s[..end].parse().ok()
}

/// Resolve a range expression like "1-5, 8, 11-13" against a document with
/// `total_pages` pages.
///
/// Tokens that fail to parse or fall out of bounds are dropped; the rest are merged
/// into an ascending list without duplicates. An empty result is left for the caller
/// to reject.
pub fn resolve_page_set(expression: &str, total_pages: u32) -> Vec<u32> {
    let mut pages = Vec::new();

    for part in expression.split(',').map(str::trim) {
        if part.is_empty() {
            continue;
        }

        match PageRangeToken::parse(part).and_then(|token| token.expand(total_pages)) {
            Some(range) => pages.extend(range),
            None => debug!("dropping page range token {:?} (total {})", part, total_pages),
        }
    }

    pages.sort_unstable();
    pages.dedup();
    pages
}

/// Compact form of an ascending page list, e.g. `[1, 2, 3, 5]` becomes "1-3,5".
pub fn format_page_set(pages: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut iter = pages.iter().copied().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }

        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }

    parts.join(",")
}

/// The expression a freshly ingested document starts with: every page.
pub fn default_expression(total_pages: u32) -> String {
    format!("1-{}", total_pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page() {
        assert_eq!(PageRangeToken::parse("5"), Some(PageRangeToken::Single(5)));
        assert_eq!(resolve_page_set("5", 10), vec![5]);
    }

    #[test]
    fn test_page_range() {
        assert_eq!(resolve_page_set("1-5", 10), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_mixed_expression() {
        assert_eq!(
            resolve_page_set("1-5,8,11-13", 13),
            vec![1, 2, 3, 4, 5, 8, 11, 12, 13]
        );
    }

    #[test]
    fn test_whitespace_around_tokens() {
        assert_eq!(resolve_page_set(" 1 - 3 ,  8 ", 10), vec![1, 2, 3, 8]);
    }

    #[test]
    fn test_reverse_range_dropped() {
        assert!(resolve_page_set("5-1", 10).is_empty());
    }

    #[test]
    fn test_empty_expression() {
        assert!(resolve_page_set("", 10).is_empty());
        assert!(resolve_page_set(" , ,", 10).is_empty());
    }

    #[test]
    fn test_malformed_token_dropped() {
        assert_eq!(resolve_page_set("3-abc,2", 10), vec![2]);
        assert_eq!(resolve_page_set("abc,3-,-4,7", 10), vec![7]);
    }

    #[test]
    fn test_numbers_read_from_leading_digits() {
        assert_eq!(resolve_page_set("5abc", 10), vec![5]);
        assert_eq!(resolve_page_set("2.5", 10), vec![2]);
        assert_eq!(resolve_page_set("1-2-3", 10), vec![1, 2]);
        assert_eq!(resolve_page_set("2x-4y", 10), vec![2, 3, 4]);
        assert_eq!(resolve_page_set("x5", 10), Vec::<u32>::new());
    }

    #[test]
    fn test_out_of_bounds_dropped() {
        assert_eq!(resolve_page_set("0,4,15", 10), vec![4]);
        assert_eq!(resolve_page_set("8-12,1-2", 10), vec![1, 2]);
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        assert_eq!(resolve_page_set("5,1,3", 10), vec![1, 3, 5]);
        assert_eq!(resolve_page_set("2-4,3,3-6,2", 10), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_results_within_bounds() {
        let expressions = ["1-100", "0-3", "9,10,11", "3-3,2-2", "x,1-x,4-2,6"];
        for total in 1..=12 {
            for expr in expressions {
                let pages = resolve_page_set(expr, total);
                assert!(pages.iter().all(|&p| p >= 1 && p <= total), "{expr} / {total}");
                assert!(pages.windows(2).all(|w| w[0] < w[1]), "{expr} / {total}");
            }
        }
    }

    #[test]
    fn test_format_page_set() {
        assert_eq!(format_page_set(&[1, 2, 3, 5]), "1-3,5");
        assert_eq!(format_page_set(&[4]), "4");
        assert_eq!(format_page_set(&[]), "");
        assert_eq!(format_page_set(&[1, 3, 4, 5, 9, 10]), "1,3-5,9-10");
    }

    #[test]
    fn test_resolving_formatted_set_is_stable() {
        for (expr, total) in [("1-5,8,11-13", 13), ("9,2,3,3-4", 10), ("7-2,x", 7), ("", 3)] {
            let first = resolve_page_set(expr, total);
            let again = resolve_page_set(&format_page_set(&first), total);
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_default_expression_covers_everything() {
        assert_eq!(default_expression(4), "1-4");
        assert_eq!(resolve_page_set(&default_expression(4), 4), vec![1, 2, 3, 4]);
    }
}
