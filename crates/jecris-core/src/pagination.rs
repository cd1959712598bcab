//! Fixed-size pagination of book content.
//!
//! Pages are cut every [`CHARACTERS_PER_PAGE`] characters. Offsets count
//! Unicode scalar values, so a page boundary never falls inside a multi-byte
//! character.

use serde::Serialize;

/// Number of characters on a reader page.
pub const CHARACTERS_PER_PAGE: usize = 1000;

/// A requested page outside `[1, total_pages]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("page {page} not found (book has {total_pages} pages)")]
pub struct PageError {
    /// The page that was requested.
    pub page: i64,
    /// Number of pages the content actually has.
    pub total_pages: usize,
}

/// One page of content, borrowed from the book text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page<'a> {
    /// 1-based page number.
    pub number: usize,
    /// Total pages in the content.
    pub total_pages: usize,
    /// Text of this page.
    pub content: &'a str,
}

impl Page<'_> {
    /// Whether a following page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    /// Whether a preceding page exists.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// Number of pages in `content`: ceil(chars / page size). Empty content has none.
#[must_use]
pub fn total_pages(content: &str) -> usize {
    pages_for_chars(content.chars().count())
}

/// Number of pages needed for `chars` characters of content.
#[must_use]
pub const fn pages_for_chars(chars: usize) -> usize {
    chars.div_ceil(CHARACTERS_PER_PAGE)
}

/// Slice page `number` (1-based) out of `content`.
///
/// # Errors
///
/// Returns `PageError` when `number` is below 1 or beyond the last page.
pub fn page(content: &str, number: i64) -> Result<Page<'_>, PageError> {
    let total = total_pages(content);
    let out_of_range = PageError {
        page: number,
        total_pages: total,
    };

    let index = usize::try_from(number)
        .ok()
        .filter(|n| (1..=total).contains(n))
        .ok_or(out_of_range)?;

    let start_char = (index - 1) * CHARACTERS_PER_PAGE;
    let start = byte_offset(content, start_char);
    let end = byte_offset(&content[start..], CHARACTERS_PER_PAGE) + start;

    Ok(Page {
        number: index,
        total_pages: total,
        content: &content[start..end],
    })
}

/// Byte offset of the `chars`-th character, or the string length if shorter.
fn byte_offset(s: &str, chars: usize) -> usize {
    s.char_indices().nth(chars).map_or(s.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(""), 0);
        assert_eq!(total_pages("a"), 1);
        assert_eq!(total_pages(&"a".repeat(CHARACTERS_PER_PAGE)), 1);
        assert_eq!(total_pages(&"a".repeat(CHARACTERS_PER_PAGE + 1)), 2);
    }

    #[test]
    fn pages_concatenate_to_original() {
        // Mix of 1-, 2-, 3- and 4-byte characters so byte and char offsets diverge.
        let content: String = "aé€😀".chars().cycle().take(3 * CHARACTERS_PER_PAGE + 17).collect();
        let total = total_pages(&content);
        assert_eq!(total, 4);

        let mut rebuilt = String::new();
        for n in 1..=total {
            let p = page(&content, i64::try_from(n).unwrap()).unwrap();
            assert_eq!(p.number, n);
            assert_eq!(p.total_pages, total);
            if n < total {
                assert_eq!(p.content.chars().count(), CHARACTERS_PER_PAGE);
            }
            rebuilt.push_str(p.content);
        }
        assert_eq!(rebuilt, content);
    }

    #[test]
    fn last_page_holds_the_remainder() {
        let content = "b".repeat(CHARACTERS_PER_PAGE + 5);
        let last = page(&content, 2).unwrap();
        assert_eq!(last.content, "bbbbb");
        assert!(!last.has_next());
        assert!(last.has_previous());
    }

    #[test]
    fn out_of_range_pages_are_not_found() {
        let content = "c".repeat(CHARACTERS_PER_PAGE * 2);
        for n in [0, -1, 3, i64::MAX] {
            assert_eq!(
                page(&content, n),
                Err(PageError {
                    page: n,
                    total_pages: 2
                })
            );
        }
    }

    #[test]
    fn empty_content_has_no_pages() {
        assert!(page("", 1).is_err());
    }

    #[test]
    fn slicing_is_stable() {
        let content = "stable ".repeat(400);
        assert_eq!(page(&content, 2).unwrap(), page(&content, 2).unwrap());
    }
}
