use std::cmp::Ordering;

use serde::{ser::SerializeStruct, Serialize, Serializer};

use super::{Member, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberSortKey {
    #[default]
    Id,
    UserName,
    Age,
}

impl MemberSortKey {
    fn column(&self) -> &'static str {
        match self {
            MemberSortKey::Id => "m.member_id",
            MemberSortKey::UserName => "m.user_name",
            MemberSortKey::Age => "m.age",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub key: MemberSortKey,
    pub direction: Direction,
}

impl Sort {
    pub fn by(key: MemberSortKey, direction: Direction) -> Self {
        Self { key, direction }
    }

    /// Parses `property[,direction]`, e.g. `userName,desc` or `age`.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let mut parts = value.split(',').map(str::trim);

        let key = match parts.next().unwrap_or_default() {
            "id" => MemberSortKey::Id,
            "userName" => MemberSortKey::UserName,
            "age" => MemberSortKey::Age,
            other => {
                return Err(ValidationError::new(format!(
                    "No property '{other}' found for type 'Member'"
                )))
            }
        };

        let direction = match parts.next() {
            None => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(d) => {
                return Err(ValidationError::new(format!(
                    "Invalid sort direction '{d}'"
                )))
            }
        };

        Ok(Self { key, direction })
    }

    /// Orders by the sort key, then by id so that equal keys keep a stable
    /// order across pages.
    pub fn compare(&self, a: &Member, b: &Member) -> Ordering {
        let ordering = match self.key {
            MemberSortKey::Id => a.id().cmp(&b.id()),
            MemberSortKey::UserName => a.user_name.as_ref().cmp(b.user_name.as_ref()),
            MemberSortKey::Age => a.age.cmp(&b.age),
        };
        let ordering = match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        ordering.then_with(|| a.id().cmp(&b.id()))
    }

    pub fn order_by_sql(&self) -> String {
        let direction = match self.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        match self.key {
            MemberSortKey::Id => format!("m.member_id {direction}"),
            key => format!("{} {direction}, m.member_id ASC", key.column()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    size: u64,
    sort: Sort,
}

impl PageRequest {
    pub fn of(page: u64, size: u64) -> Result<Self, ValidationError> {
        Self::sorted(page, size, Sort::default())
    }

    pub fn sorted(
        page: u64,
        size: u64,
        sort: Sort,
    ) -> Result<Self, ValidationError> {
        if size < 1 {
            return Err(ValidationError::new(
                "Page size must not be less than one".to_string(),
            ));
        }
        Ok(Self { page, size, sort })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    number: u64,
    size: u64,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total: u64) -> Self {
        let offset = request.offset();
        let len = content.len() as u64;
        let short = len < request.size();

        // A short page fixes the total, whatever the count query said.
        let total_elements = if offset == 0 && short {
            len
        } else if !content.is_empty()
            && (short || offset.saturating_add(request.size()) > total)
        {
            offset.saturating_add(len)
        } else {
            total
        };
        Self {
            content,
            number: request.page(),
            size: request.size(),
            total_elements,
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(self.size)
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut page = serializer.serialize_struct("Page", 9)?;
        page.serialize_field("content", &self.content)?;
        page.serialize_field("number", &self.number)?;
        page.serialize_field("size", &self.size)?;
        page.serialize_field("totalElements", &self.total_elements)?;
        page.serialize_field("totalPages", &self.total_pages())?;
        page.serialize_field("numberOfElements", &self.number_of_elements())?;
        page.serialize_field("first", &self.is_first())?;
        page.serialize_field("last", &self.is_last())?;
        page.serialize_field("empty", &self.is_empty())?;
        page.end()
    }
}

/// A page that only knows whether another one follows. Built from a query
/// that asked for one row more than the page size.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice<T> {
    pub content: Vec<T>,
    number: u64,
    size: u64,
    has_next: bool,
}

impl<T> Slice<T> {
    pub fn from_overfetch(mut rows: Vec<T>, request: &PageRequest) -> Self {
        let size = request.size() as usize;
        let has_next = rows.len() > size;
        rows.truncate(size);
        Self {
            content: rows,
            number: request.page(),
            size: request.size(),
            has_next,
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }
}
