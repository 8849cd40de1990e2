//! Shared types used across the codebase

use serde::Deserialize;

/// LIMIT/OFFSET pair applied to list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

/// `?page=&size=` as sent by clients; values stay raw until `pagination()`
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub size: Option<String>,
}

impl PageQuery {
    /// Missing values fall back to the defaults. Pagination only applies when
    /// both values parse and are at least 1; otherwise every row is returned.
    pub fn pagination(&self, default_page: i64, default_size: i64) -> Option<Pagination> {
        let page = parse_or(self.page.as_deref(), default_page)?;
        let size = parse_or(self.size.as_deref(), default_size)?;

        if page < 1 || size < 1 {
            return None;
        }

        Some(Pagination {
            limit: size,
            offset: size.checked_mul(page - 1)?,
        })
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> Option<i64> {
    match raw.map(str::trim) {
        None | Some("") => Some(default),
        Some(value) => value.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, size: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(String::from),
            size: size.map(String::from),
        }
    }

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let p = query(None, None).pagination(1, 20);
        assert_eq!(p, Some(Pagination { limit: 20, offset: 0 }));
    }

    #[test]
    fn offsets_by_size_times_previous_pages() {
        let p = query(Some("3"), Some("5")).pagination(1, 20);
        assert_eq!(p, Some(Pagination { limit: 5, offset: 10 }));
    }

    #[test]
    fn zero_or_garbage_disables_pagination() {
        assert_eq!(query(Some("0"), Some("5")).pagination(1, 20), None);
        assert_eq!(query(Some("1"), Some("-2")).pagination(1, 20), None);
        assert_eq!(query(Some("abc"), None).pagination(1, 20), None);
    }
}
