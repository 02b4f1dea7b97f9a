//! Kanji numerals as they appear in article numbers and law numbers.

/// Parse a kanji (or Arabic) numeral into an integer.
///
/// Supports positional digits (`二〇`), multipliers (`十`, `百`, `千`),
/// the `万` unit and the era-year form `元` (first year).
///
/// # Examples
/// ```
/// use lawtext_analyzer::numeral::parse_kanji_num;
///
/// assert_eq!(parse_kanji_num("三百九十四"), Some(394));
/// assert_eq!(parse_kanji_num("元"), Some(1));
/// assert_eq!(parse_kanji_num("条"), None);
/// ```
#[must_use]
pub fn parse_kanji_num(text: &str) -> Option<u64> {
    if text == "元" {
        return Some(1);
    }
    if text.is_empty() {
        return None;
    }

    let mut total: u64 = 0;
    let mut section: u64 = 0;
    let mut current: Option<u64> = None;

    for c in text.chars() {
        if let Some(d) = digit(c) {
            current = Some(current.map_or(d, |n| n * 10 + d));
        } else if let Some(mult) = multiplier(c) {
            section += current.unwrap_or(1) * mult;
            current = None;
        } else if c == '万' {
            let unit = section + current.unwrap_or(0);
            total += unit.max(1) * 10_000;
            section = 0;
            current = None;
        } else {
            return None;
        }
    }

    Some(total + section + current.unwrap_or(0))
}

fn digit(c: char) -> Option<u64> {
    let d = match c {
        '〇' | '零' => 0,
        '一' => 1,
        '二' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        '０'..='９' => u64::from(c as u32 - '０' as u32),
        _ => return c.to_digit(10).map(u64::from),
    };
    Some(d)
}

fn multiplier(c: char) -> Option<u64> {
    match c {
        '十' => Some(10),
        '百' => Some(100),
        '千' => Some(1000),
        _ => None,
    }
}

/// Normalize a branch number such as `三条の二` or `三の二` to the `Num`
/// attribute form `3_2`.
///
/// A trailing unit character (`条`, `項`, `号`, ...) on the first part is
/// ignored.
#[must_use]
pub fn num_to_attr(text: &str) -> Option<String> {
    let parts: Vec<u64> = text
        .split('の')
        .map(|part| {
            let part = part.trim_end_matches(|c: char| UNIT_CHARS.contains(&c));
            parse_kanji_num(part)
        })
        .collect::<Option<_>>()?;
    Some(
        parts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join("_"),
    )
}

const UNIT_CHARS: &[char] = &['編', '章', '節', '款', '目', '条', '項', '号'];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_digits() {
        assert_eq!(parse_kanji_num("一"), Some(1));
        assert_eq!(parse_kanji_num("九"), Some(9));
        assert_eq!(parse_kanji_num("〇"), Some(0));
    }

    #[test]
    fn test_multipliers() {
        assert_eq!(parse_kanji_num("十"), Some(10));
        assert_eq!(parse_kanji_num("十一"), Some(11));
        assert_eq!(parse_kanji_num("二十九"), Some(29));
        assert_eq!(parse_kanji_num("百二"), Some(102));
        assert_eq!(parse_kanji_num("千九百四十七"), Some(1947));
    }

    #[test]
    fn test_positional_and_arabic() {
        assert_eq!(parse_kanji_num("二〇二三"), Some(2023));
        assert_eq!(parse_kanji_num("12"), Some(12));
        assert_eq!(parse_kanji_num("１２"), Some(12));
    }

    #[test]
    fn test_man_unit() {
        assert_eq!(parse_kanji_num("一万二千"), Some(12_000));
        assert_eq!(parse_kanji_num("万"), Some(10_000));
    }

    #[test]
    fn test_gannen() {
        assert_eq!(parse_kanji_num("元"), Some(1));
    }

    #[test]
    fn test_invalid() {
        assert_eq!(parse_kanji_num(""), None);
        assert_eq!(parse_kanji_num("三条"), None);
    }

    #[test]
    fn test_num_to_attr() {
        assert_eq!(num_to_attr("三").as_deref(), Some("3"));
        assert_eq!(num_to_attr("三条の二").as_deref(), Some("3_2"));
        assert_eq!(num_to_attr("十の二の三").as_deref(), Some("10_2_3"));
        assert_eq!(num_to_attr("前"), None);
    }
}
