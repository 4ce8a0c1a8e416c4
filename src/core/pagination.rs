//! Select menu pagination
//!
//! A select menu holds at most 25 options. Longer lists are split into pages
//! where the first page shows 24 items and a `➡️` entry, middle pages show a
//! `⬅️` entry, 23 items and a `➡️` entry, and the last page shows a `⬅️`
//! entry and the rest. Navigation entries carry the value `{page}p`.

use crate::core::response::MAX_CHOICES;
use crate::dispatch::reply::SelectOption;

pub const PREV_EMOJI: &str = "⬅️";
pub const NEXT_EMOJI: &str = "➡️";

/// Number of pages needed for `len` items (pages are 1-based)
pub fn page_count(len: usize) -> usize {
    if len <= MAX_CHOICES {
        return 1;
    }
    // first and last page each spend one slot on navigation, middle pages two
    (len - MAX_CHOICES).div_ceil(MAX_CHOICES - 2) + 1
}

/// Parse a navigation value such as `3p`
pub fn parse_page(value: &str) -> Option<usize> {
    value.strip_suffix('p')?.parse().ok().filter(|&p| p >= 1)
}

fn nav(page: usize, emoji: &str) -> SelectOption {
    SelectOption::new(format!("{page}p"), format!("{page}p")).emoji(emoji)
}

/// Build the options for one page, clamping `page` into range
pub fn menu_page(items: &[SelectOption], page: usize) -> Vec<SelectOption> {
    let pages = page_count(items.len());
    if pages == 1 {
        return items.to_vec();
    }
    let page = page.clamp(1, pages);

    let per_middle = MAX_CHOICES - 2;
    let start = if page == 1 {
        0
    } else {
        (MAX_CHOICES - 1) + per_middle * (page - 2)
    };
    let end = if page == pages {
        items.len()
    } else {
        (MAX_CHOICES - 1) + per_middle * (page - 1)
    };

    let mut options = Vec::with_capacity(MAX_CHOICES);
    if page > 1 {
        options.push(nav(page - 1, PREV_EMOJI));
    }
    options.extend_from_slice(&items[start..end.min(items.len())]);
    if page < pages {
        options.push(nav(page + 1, NEXT_EMOJI));
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<SelectOption> {
        (0..n)
            .map(|i| SelectOption::new(format!("item {i}"), i.to_string()))
            .collect()
    }

    fn values(options: &[SelectOption]) -> Vec<String> {
        options.iter().map(|o| o.value.clone()).collect()
    }

    #[test]
    fn test_single_page() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(25), 1);
        let page = menu_page(&items(25), 1);
        assert_eq!(page.len(), 25);
        assert!(page.iter().all(|o| o.emoji.is_none()));
    }

    #[test]
    fn test_two_pages() {
        let all = items(26);
        assert_eq!(page_count(26), 2);

        let first = menu_page(&all, 1);
        assert_eq!(first.len(), 25);
        assert_eq!(first.last().unwrap().value, "2p");
        assert_eq!(first[0].value, "0");

        let second = menu_page(&all, 2);
        assert_eq!(values(&second), vec!["1p", "24", "25"]);
    }

    #[test]
    fn test_middle_pages_and_coverage() {
        let all = items(100);
        let pages = page_count(all.len());

        let mut seen = Vec::new();
        for page in 1..=pages {
            let options = menu_page(&all, page);
            assert!(options.len() <= MAX_CHOICES);
            seen.extend(
                options
                    .iter()
                    .filter(|o| parse_page(&o.value).is_none())
                    .map(|o| o.value.clone()),
            );
            if page > 1 && page < pages {
                assert_eq!(options.first().unwrap().value, format!("{}p", page - 1));
                assert_eq!(options.last().unwrap().value, format!("{}p", page + 1));
            }
        }
        let expected: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_out_of_range_page_is_clamped() {
        let all = items(60);
        assert_eq!(menu_page(&all, 0), menu_page(&all, 1));
        assert_eq!(menu_page(&all, 99), menu_page(&all, page_count(60)));
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page("3p"), Some(3));
        assert_eq!(parse_page("0p"), None);
        assert_eq!(parse_page("help"), None);
        assert_eq!(parse_page("p"), None);
    }
}
