// Catalog
pub mod brands;
pub mod categories;
pub mod inventory;
pub mod products;

// Customers and staff
pub mod customers;
pub mod members;

// Sales
pub mod orders;
pub mod promotions;
pub mod reviews;

// Reporting
pub mod dashboard;

// Multi-table deletes shared by the services above
pub mod cascade;

use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::forms::{FieldErrors, INVALID_CHOICE};

/// Page selection for list operations; pages are 1-based.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 500),
        }
    }

    /// Zero-based page index as expected by the paginator.
    pub fn index(&self) -> u64 {
        self.page.max(1) - 1
    }

    pub fn size(&self) -> u64 {
        self.per_page.clamp(1, 500)
    }
}

/// One page of a list plus the totals needed to render pagination.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let per_page = request.size();
        Self {
            items,
            total,
            page: request.page.max(1),
            per_page,
            total_pages: if total == 0 {
                0
            } else {
                (total + per_page - 1) / per_page
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// `LOWER(column) = LOWER(value)`, used for case-insensitive uniqueness.
pub(crate) fn lower_eq<C: ColumnTrait>(column: C, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column.as_column_ref()))).eq(value.to_lowercase())
}

/// Whether another row of `E` already uses `value` in `column`, ignoring case.
pub(crate) async fn name_taken<E, C, K>(
    conn: &K,
    column: C,
    value: &str,
    exclude: Option<(E::Column, i32)>,
) -> Result<bool, ServiceError>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ColumnTrait,
    K: ConnectionTrait,
{
    let mut query = E::find().filter(lower_eq(column, value));
    if let Some((id_column, id)) = exclude {
        query = query.filter(id_column.ne(id));
    }
    Ok(query.count(conn).await? > 0)
}

/// Records a field error when an optional reference submitted from a
/// dropdown no longer exists. Storage failures are returned as errors.
pub(crate) async fn check_reference<E, K>(
    conn: &K,
    errors: &mut FieldErrors,
    field: &str,
    id: Option<i32>,
) -> Result<(), ServiceError>
where
    E: EntityTrait,
    <E::PrimaryKey as sea_orm::PrimaryKeyTrait>::ValueType: From<i32>,
    K: ConnectionTrait,
{
    let Some(id) = id else {
        return Ok(());
    };
    if E::find_by_id(id).one(conn).await?.is_none() {
        errors.add(field, INVALID_CHOICE);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_counts_round_up() {
        let page = Page::new(vec![1, 2], 41, PageRequest::new(3, 20));
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 3);

        let empty: Page<i32> = Page::new(vec![], 0, PageRequest::default());
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn page_request_is_clamped() {
        let request = PageRequest::new(0, 10_000);
        assert_eq!(request.index(), 0);
        assert_eq!(request.size(), 500);
    }
}
