//! Typed accessors over [`PropertyMap`] text values.
//!
//! # Design Decisions
//! - Integers follow decimal `atoi` rules: leading garbage parses as 0
//! - A trailing `k`/`K` multiplies by 1024, `m`/`M` by 1024 * 1024
//! - Booleans recognise on/off, leading t/f/y/n and a lone 1/0; anything
//!   else falls back to the caller's default
//! - Lists split on spaces, tabs and commas

use crate::arena::ArenaStr;
use crate::map::PropertyMap;

/// Characters separating list items.
pub const LIST_DELIMITERS: &[char] = &[' ', '\t', ','];

/// Slots added to a string list each time it fills up.
const LIST_CAPACITY_INC: usize = 5;

impl PropertyMap {
    /// Integer value of `name`, honouring `k`/`m` size suffixes.
    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        match self.get_str(name) {
            Some(v) if !v.is_empty() => parse_size(v),
            _ => default,
        }
    }

    /// Floating point value of `name`.
    pub fn get_double(&self, name: &str, default: f64) -> f64 {
        self.get_str(name).map_or(default, atof)
    }

    /// Boolean value of `name`.
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.get_str(name).map_or(default, |v| bool_code(v, default))
    }

    /// Split the value of `name` (or `default`) into arena-owned items.
    ///
    /// Returns `None` when neither the entry nor a default exists, or when
    /// the arena cannot hold the items.
    pub fn get_string_list(&mut self, name: &str, default: Option<&str>) -> Option<Vec<&str>> {
        let source = match self.get_str(name) {
            Some(v) => v.to_string(),
            None => default?.to_string(),
        };

        let mut items: Vec<ArenaStr> = Vec::new();
        for token in split_list(&source) {
            if items.len() == items.capacity()
                && items.try_reserve_exact(LIST_CAPACITY_INC).is_err()
            {
                tracing::error!(name, "Failed to grow string list");
                return None;
            }
            match self.arena.dup_str(token) {
                Some(item) => items.push(item),
                None => {
                    tracing::error!(name, item = token, "Error in string allocation");
                    return None;
                }
            }
        }

        let arena = &self.arena;
        items.into_iter().map(|item| arena.str(item)).collect()
    }

    /// Split the value of `name` (or `default`) without touching the arena.
    ///
    /// Items borrow from the stored value, so this works on a map shared
    /// behind an `Arc`.
    pub fn get_list<'a>(&'a self, name: &str, default: Option<&'a str>) -> Option<Vec<&'a str>> {
        let source = self.get_str(name).or(default)?;
        Some(split_list(source).collect())
    }

    /// Parse up to `max` integers from the value of `name` (or `default`).
    ///
    /// Items past `max` are ignored.
    pub fn get_int_list(&self, name: &str, max: usize, default: Option<&str>) -> Vec<i64> {
        let source = match self.get_str(name).or(default) {
            Some(v) => v,
            None => return Vec::new(),
        };
        split_list(source).take(max).map(atoi).collect()
    }
}

/// Non-empty items of a delimited list.
pub fn split_list(value: &str) -> impl Iterator<Item = &str> + '_ {
    value.split(LIST_DELIMITERS).filter(|item| !item.is_empty())
}

/// Parse an integer with an optional `k`/`m` multiplier suffix.
pub fn parse_size(value: &str) -> i64 {
    let (digits, multiplier) = match value.as_bytes().last() {
        Some(b'm' | b'M') => (&value[..value.len() - 1], 1024 * 1024),
        Some(b'k' | b'K') => (&value[..value.len() - 1], 1024),
        _ => (value, 1),
    };
    atoi(digits).saturating_mul(multiplier)
}

/// Decimal integer prefix of `value`; 0 when there is none.
pub fn atoi(value: &str) -> i64 {
    let s = value.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut n: i64 = 0;
    for b in rest.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(b - b'0');
        n = if negative {
            n.saturating_mul(10).saturating_sub(digit)
        } else {
            n.saturating_mul(10).saturating_add(digit)
        };
    }
    n
}

/// Floating point prefix of `value`; 0.0 when there is none.
pub fn atof(value: &str) -> f64 {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return 0.0;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(0.0)
}

/// Interpret `value` as a boolean flag.
pub fn bool_code(value: &str, default: bool) -> bool {
    let first = value.as_bytes().first().copied();
    if value.eq_ignore_ascii_case("off")
        || matches!(first, Some(b'F' | b'f' | b'N' | b'n'))
        || value == "0"
    {
        false
    } else if value.eq_ignore_ascii_case("on")
        || matches!(first, Some(b'T' | b't' | b'Y' | b'y'))
        || value == "1"
    {
        true
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::shared::SharedProperties;
    use crate::map::Value;

    #[test]
    fn test_get_int_suffixes() {
        let mut map = PropertyMap::new();
        map.put_str("small", "5k").unwrap();
        map.put_str("large", "2M").unwrap();
        map.put_str("plain", "42").unwrap();
        map.put_str("junk", "abc").unwrap();
        map.put("empty", Value::shared("")).unwrap();

        assert_eq!(map.get_int("small", 0), 5120);
        assert_eq!(map.get_int("large", 0), 2_097_152);
        assert_eq!(map.get_int("plain", 0), 42);
        assert_eq!(map.get_int("junk", 9), 0);
        assert_eq!(map.get_int("empty", 9), 9);
        assert_eq!(map.get_int("absent", 7), 7);
    }

    #[test]
    fn test_atoi_rules() {
        assert_eq!(atoi("  -12abc"), -12);
        assert_eq!(atoi("+8"), 8);
        assert_eq!(atoi("x1"), 0);
        assert_eq!(atoi(""), 0);
        assert_eq!(atoi("99999999999999999999999"), i64::MAX);
    }

    #[test]
    fn test_get_bool() {
        let mut map = PropertyMap::new();
        let values = [
            ("a", "On"),
            ("b", "no"),
            ("c", "maybe"),
            ("d", "1"),
            ("e", "10"),
            ("f", "OFF"),
        ];
        for (k, v) in values {
            map.put_str(k, v).unwrap();
        }

        assert!(map.get_bool("a", false));
        assert!(!map.get_bool("b", true));
        assert!(map.get_bool("c", true));
        assert!(!map.get_bool("c", false));
        assert!(map.get_bool("d", false));
        assert!(!map.get_bool("e", false));
        assert!(map.get_bool("e", true));
        assert!(!map.get_bool("f", true));
        assert!(map.get_bool("absent", true));
    }

    #[test]
    fn test_get_double() {
        let mut map = PropertyMap::new();
        map.put_str("ratio", "0.25").unwrap();
        map.put_str("sci", "1.5e3ms").unwrap();
        map.put_str("bad", "fast").unwrap();

        assert_eq!(map.get_double("ratio", 1.0), 0.25);
        assert_eq!(map.get_double("sci", 0.0), 1500.0);
        assert_eq!(map.get_double("bad", 3.0), 0.0);
        assert_eq!(map.get_double("absent", 3.0), 3.0);
        assert_eq!(atof("2e"), 2.0);
        assert_eq!(atof("-.5"), -0.5);
    }

    #[test]
    fn test_get_string_list() {
        let mut map = PropertyMap::new();
        map.put_str("workers", "ajp13, lb\tstatus,,other").unwrap();

        let list = map.get_string_list("workers", None).unwrap();
        assert_eq!(list, vec!["ajp13", "lb", "status", "other"]);

        let list = map.get_string_list("absent", Some("a b")).unwrap();
        assert_eq!(list, vec!["a", "b"]);

        assert!(map.get_string_list("absent", None).is_none());
    }

    #[test]
    fn test_get_list_through_shared_handle() {
        let mut map = PropertyMap::new();
        map.put_str("worker.list", "lb, status node1").unwrap();
        let shared = SharedProperties::new(map);

        let snapshot = shared.load();
        let before = snapshot.arena_stats();
        assert_eq!(
            snapshot.get_list("worker.list", None),
            Some(vec!["lb", "status", "node1"])
        );
        assert_eq!(snapshot.get_list("absent", Some("a,b")), Some(vec!["a", "b"]));
        assert_eq!(snapshot.get_list("absent", None), None);
        assert_eq!(snapshot.arena_stats(), before);
    }

    #[test]
    fn test_get_string_list_grows_past_increment() {
        let mut map = PropertyMap::new();
        map.put_str("many", "1 2 3 4 5 6 7 8 9 10 11").unwrap();
        let list = map.get_string_list("many", None).unwrap();
        assert_eq!(list.len(), 11);
        assert_eq!(list[10], "11");
    }

    #[test]
    fn test_get_int_list_drops_excess() {
        let mut map = PropertyMap::new();
        map.put_str("codes", "500, 503 ,-404 x").unwrap();

        assert_eq!(map.get_int_list("codes", 2, None), vec![500, 503]);
        assert_eq!(map.get_int_list("codes", 10, None), vec![500, 503, -404, 0]);
        assert!(map.get_int_list("codes", 0, None).is_empty());
        assert_eq!(map.get_int_list("absent", 3, Some("1,2")), vec![1, 2]);
    }
}
