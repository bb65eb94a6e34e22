use regex::Regex;
use std::sync::LazyLock;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern"));

/// Counts the pages covered by a free-form range such as `"123-145, 200"`.
///
/// Comma separated parts are summed. A part is either a single page or a
/// `start-end` pair; the trailing run of digits of each side is used, so
/// `"12a"` reads as 12. Parts with more than one hyphen or without digits
/// are skipped. Inverted ranges are not rejected and contribute
/// `end - start + 1` as computed, which may be negative.
///
/// Returns an empty string when nothing could be counted or the sum is zero.
pub fn page_count(range: &str) -> String {
    let total: i64 = range.split(',').filter_map(part_count).sum();
    if total == 0 {
        String::new()
    } else {
        total.to_string()
    }
}

fn part_count(part: &str) -> Option<i64> {
    let sections: Vec<&str> = part.split('-').collect();
    match sections.as_slice() {
        [single] => trailing_number(single).map(|_| 1),
        [start, end] => Some(trailing_number(end)? - trailing_number(start)? + 1),
        _ => None,
    }
}

fn trailing_number(section: &str) -> Option<i64> {
    DIGITS.find_iter(section).last()?.as_str().parse().ok()
}
