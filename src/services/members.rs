use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryOrder, Set,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::entities::member;
use crate::errors::ServiceError;
use crate::forms::{FieldErrors, FormFields, ValidatedForm};
use crate::media::{DefaultImage, MediaStore, MEMBER_PICTURE_FOLDER};
use crate::services::{name_taken, Page, PageRequest};

const EMAIL_TAKEN: &str = "A member with this email already exists.";

#[derive(Debug, Clone)]
pub struct MemberInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub bio: Option<String>,
}

impl ValidatedForm for MemberInput {
    fn from_form(mut form: FormFields) -> Result<Self, FieldErrors> {
        let first_name = form.required_text("first_name");
        let last_name = form.required_text("last_name");
        let email = form.required_email("email");
        let date_of_birth = form.optional_date("date_of_birth");
        if matches!(date_of_birth, Some(dob) if dob > Utc::now().date_naive()) {
            form.error("date_of_birth", "Date of birth cannot be in the future.");
        }
        let input = MemberInput {
            first_name,
            last_name,
            email,
            phone_number: form.optional_text("phone_number"),
            date_of_birth,
            bio: form.optional_text("bio"),
        };
        form.finish(input)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    #[serde(flatten)]
    pub member: member::Model,
    pub full_name: String,
    pub profile_picture_url: String,
}

#[derive(Clone)]
pub struct MemberService {
    db: Arc<DatabaseConnection>,
    media: Arc<MediaStore>,
}

impl MemberService {
    pub fn new(db: Arc<DatabaseConnection>, media: Arc<MediaStore>) -> Self {
        Self { db, media }
    }

    /// Members, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, page: PageRequest) -> Result<Page<MemberView>, ServiceError> {
        let paginator = member::Entity::find()
            .order_by_desc(member::Column::CreatedAt)
            .order_by_desc(member::Column::Id)
            .paginate(&*self.db, page.size());
        let total = paginator.num_items().await?;
        let members = paginator.fetch_page(page.index()).await?;
        Ok(Page::new(members, total, page).map(|m| self.view(m)))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<member::Model, ServiceError> {
        member::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member", id))
    }

    pub async fn detail(&self, id: i32) -> Result<MemberView, ServiceError> {
        let member = self.get(id).await?;
        Ok(self.view(member))
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: MemberInput) -> Result<member::Model, ServiceError> {
        self.check_email(&input.email, None).await?;
        let now = Utc::now();
        let created = member::ActiveModel {
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            phone_number: Set(input.phone_number),
            date_of_birth: Set(input.date_of_birth),
            bio: Set(input.bio),
            profile_picture: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|err| ServiceError::from_integrity(err, &[("email", "email", EMAIL_TAKEN)]))?;

        counter!("members.created", 1);
        info!(member_id = created.id, "created member");
        Ok(created)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn update(&self, id: i32, input: MemberInput) -> Result<member::Model, ServiceError> {
        let existing = self.get(id).await?;
        self.check_email(&input.email, Some(id)).await?;

        let mut active: member::ActiveModel = existing.into();
        active.first_name = Set(input.first_name);
        active.last_name = Set(input.last_name);
        active.email = Set(input.email);
        active.phone_number = Set(input.phone_number);
        active.date_of_birth = Set(input.date_of_birth);
        active.bio = Set(input.bio);
        active.updated_at = Set(Utc::now());
        let updated = active
            .update(&*self.db)
            .await
            .map_err(|err| ServiceError::from_integrity(err, &[("email", "email", EMAIL_TAKEN)]))?;

        info!(member_id = id, "updated member");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<member::Model, ServiceError> {
        let existing = self.get(id).await?;
        existing.clone().delete(&*self.db).await?;
        if let Some(path) = existing.profile_picture.as_deref() {
            self.media.discard(path).await;
        }
        counter!("members.deleted", 1);
        info!(member_id = id, "deleted member");
        Ok(existing)
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_picture(
        &self,
        id: i32,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<member::Model, ServiceError> {
        let existing = self.get(id).await?;
        let stored = self.media.save(MEMBER_PICTURE_FOLDER, file_name, bytes).await?;
        self.replace_picture(existing, Some(stored)).await
    }

    #[instrument(skip(self))]
    pub async fn clear_picture(&self, id: i32) -> Result<member::Model, ServiceError> {
        let existing = self.get(id).await?;
        self.replace_picture(existing, None).await
    }

    async fn replace_picture(
        &self,
        existing: member::Model,
        picture: Option<String>,
    ) -> Result<member::Model, ServiceError> {
        let previous = existing.profile_picture.clone();
        let mut active: member::ActiveModel = existing.into();
        active.profile_picture = Set(picture);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;
        if let Some(path) = previous.as_deref() {
            self.media.discard(path).await;
        }
        Ok(updated)
    }

    fn view(&self, member: member::Model) -> MemberView {
        MemberView {
            full_name: member.full_name(),
            profile_picture_url: self
                .media
                .url_for(member.profile_picture.as_deref(), DefaultImage::MemberProfile),
            member,
        }
    }

    async fn check_email(&self, email: &str, id: Option<i32>) -> Result<(), ServiceError> {
        let exclude = id.map(|id| (member::Column::Id, id));
        if name_taken::<member::Entity, _, _>(&*self.db, member::Column::Email, email, exclude)
            .await?
        {
            return Err(ServiceError::conflict("email", EMAIL_TAKEN));
        }
        Ok(())
    }
}
