use std::sync::Arc;

use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::entities::{category, product};
use crate::errors::ServiceError;
use crate::forms::{FieldErrors, FormFields, ValidatedForm, INVALID_CHOICE};
use crate::services::{cascade, name_taken, Page, PageRequest};

const NAME_TAKEN: &str = "A category with this name already exists.";

#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub category_name: String,
    pub parent_category_id: Option<i32>,
    pub description: Option<String>,
}

impl ValidatedForm for CategoryInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let input = CategoryInput {
            category_name: form.required_text("category_name"),
            parent_category_id: form.optional_reference("parent_category"),
            description: form.optional_text("description"),
        };
        form.finish(input)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRow {
    #[serde(flatten)]
    pub category: category::Model,
    pub parent_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    pub category: category::Model,
    pub parent: Option<category::Model>,
    pub children: Vec<category::Model>,
    pub product_count: u64,
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: PageRequest) -> Result<Page<CategoryRow>, ServiceError> {
        let paginator = category::Entity::find()
            .order_by_asc(category::Column::CategoryName)
            .paginate(&*self.db, page.size());
        let total = paginator.num_items().await?;
        let categories = paginator.fetch_page(page.index()).await?;

        let names = self.all().await?;
        let items = categories
            .into_iter()
            .map(|category| CategoryRow {
                parent_name: category.parent_category_id.and_then(|parent_id| {
                    names
                        .iter()
                        .find(|c| c.id == parent_id)
                        .map(|c| c.category_name.clone())
                }),
                category,
            })
            .collect();
        Ok(Page::new(items, total, page))
    }

    /// Every category by name, for dropdowns.
    pub async fn all(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::CategoryName)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, id: i32) -> Result<CategoryDetail, ServiceError> {
        let db = &*self.db;
        let category = self.get(id).await?;
        let parent = match category.parent_category_id {
            Some(parent_id) => category::Entity::find_by_id(parent_id).one(db).await?,
            None => None,
        };
        let children = category::Entity::find()
            .filter(category::Column::ParentCategoryId.eq(id))
            .order_by_asc(category::Column::CategoryName)
            .all(db)
            .await?;
        let product_count = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(db)
            .await?;
        Ok(CategoryDetail {
            category,
            parent,
            children,
            product_count,
        })
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CategoryInput) -> Result<category::Model, ServiceError> {
        self.check(None, &input).await?;
        let created = category::ActiveModel {
            category_name: Set(input.category_name),
            parent_category_id: Set(input.parent_category_id),
            description: Set(input.description),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|err| {
            ServiceError::from_integrity(err, &[("category_name", "category_name", NAME_TAKEN)])
        })?;

        counter!("catalog.categories.created", 1);
        info!(category_id = created.id, name = %created.category_name, "created category");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        input: CategoryInput,
    ) -> Result<category::Model, ServiceError> {
        let existing = self.get(id).await?;
        self.check(Some(id), &input).await?;
        let mut active: category::ActiveModel = existing.into();
        active.category_name = Set(input.category_name);
        active.parent_category_id = Set(input.parent_category_id);
        active.description = Set(input.description);
        let updated = active.update(&*self.db).await.map_err(|err| {
            ServiceError::from_integrity(err, &[("category_name", "category_name", NAME_TAKEN)])
        })?;

        info!(category_id = id, "updated category");
        Ok(updated)
    }

    /// Deletes the category with its sub-categories and their products.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<category::Model, ServiceError> {
        let existing = self.get(id).await?;
        let txn = self.db.begin().await?;
        cascade::delete_category(&txn, id).await?;
        txn.commit().await?;

        counter!("catalog.categories.deleted", 1);
        info!(category_id = id, name = %existing.category_name, "deleted category");
        Ok(existing)
    }

    async fn check(&self, id: Option<i32>, input: &CategoryInput) -> Result<(), ServiceError> {
        let db = &*self.db;
        let mut errors = FieldErrors::new();

        if let Some(parent_id) = input.parent_category_id {
            if Some(parent_id) == id {
                errors.add("parent_category", "A category cannot be its own parent.");
            } else if category::Entity::find_by_id(parent_id).one(db).await?.is_none() {
                errors.add("parent_category", INVALID_CHOICE);
            } else if let Some(id) = id {
                let below = cascade::descendant_categories(db, id).await?;
                if below.contains(&parent_id) {
                    errors.add(
                        "parent_category",
                        "A category cannot be placed under one of its own subcategories.",
                    );
                }
            }
        }
        errors.check()?;

        let exclude = id.map(|id| (category::Column::Id, id));
        if name_taken::<category::Entity, _, _>(
            db,
            category::Column::CategoryName,
            &input.category_name,
            exclude,
        )
        .await?
        {
            return Err(ServiceError::conflict("category_name", NAME_TAKEN));
        }
        Ok(())
    }
}
