use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Default page size when the caller passes an invalid value.
pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Largest page size the API will serve.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Whitelist of sortable book columns. Anything else falls back to `id`,
/// which also keeps user input out of the ORDER BY clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Default)]
#[strum(ascii_case_insensitive)]
pub enum SortField {
    #[default]
    #[strum(serialize = "id")]
    Id,
    #[strum(serialize = "title")]
    Title,
    #[strum(serialize = "author")]
    Author,
    #[strum(serialize = "isbn")]
    Isbn,
    #[strum(serialize = "publishedDate", serialize = "published_date")]
    PublishedDate,
    #[strum(serialize = "createdAt", serialize = "created_at")]
    CreatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Author => "author",
            SortField::Isbn => "isbn",
            SortField::PublishedDate => "published_date",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Default)]
#[strum(ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Validated pagination parameters handed to the store.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub sort_by: SortField,
    pub direction: SortDirection,
}

impl PageRequest {
    /// Clamp raw query parameters: page below 0 becomes 0, size outside
    /// (0, 100] becomes 10, unknown sort fields become `id` ascending.
    pub fn clamped(page: i64, size: i64, sort_by: &str, direction: &str) -> Self {
        Self {
            page: page.max(0),
            size: if size <= 0 || size > MAX_PAGE_SIZE {
                DEFAULT_PAGE_SIZE
            } else {
                size
            },
            sort_by: sort_by.parse().unwrap_or_default(),
            direction: direction.parse().unwrap_or_default(),
        }
    }

    pub fn offset(&self) -> i64 {
        // Page is caller-supplied; an absurd value must not overflow into a
        // negative OFFSET.
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: SortField::default(),
            direction: SortDirection::default(),
        }
    }
}

/// A slice of results plus pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + request.size - 1) / request.size
        };
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamping_matches_defaults() {
        let req = PageRequest::clamped(-1, -5, "id", "ASC");
        assert_eq!(req.page, 0);
        assert_eq!(req.size, DEFAULT_PAGE_SIZE);

        let req = PageRequest::clamped(0, 500, "id", "ASC");
        assert_eq!(req.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn unknown_sort_field_falls_back_to_id() {
        let req = PageRequest::clamped(0, 10, "title; DROP TABLE books", "sideways");
        assert_eq!(req.sort_by, SortField::Id);
        assert_eq!(req.direction, SortDirection::Asc);
    }

    #[test]
    fn sort_field_parses_both_casings() {
        assert_eq!("publishedDate".parse::<SortField>().unwrap(), SortField::PublishedDate);
        assert_eq!("published_date".parse::<SortField>().unwrap(), SortField::PublishedDate);
        assert_eq!("TITLE".parse::<SortField>().unwrap(), SortField::Title);
    }

    #[test]
    fn offset_saturates_on_huge_page() {
        let req = PageRequest::clamped(i64::MAX, 10, "id", "ASC");
        assert_eq!(req.offset(), i64::MAX);
        assert!(req.offset() >= 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        let req = PageRequest::clamped(0, 10, "id", "ASC");
        let page: Page<i32> = Page::new(vec![], &req, 25);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], &req, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
