/// User model
///
/// Password and refresh-token hashes are stored but never serialized.
///
/// # Example
///
/// ```no_run
/// use argus_shared::db::{repository::Repository, value::Patch};
/// use argus_shared::models::user::{User, UserChanges};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let users = Repository::<User>::new(pool);
/// let user = users
///     .update(
///         1,
///         UserChanges {
///             bio: Patch::Null,
///             ..Default::default()
///         },
///     )
///     .await?;
/// assert!(user.bio.is_none());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{
    repository::Entity,
    value::{ColumnValues, IntoColumns, Patch},
};

text_enum! {
    UserRole("role") {
        Admin => "admin",
        User => "user",
        SuperAdmin => "super_admin",
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    pub first_name: String,

    pub last_name: String,

    #[sqlx(try_from = "String")]
    pub role: UserRole,

    pub email: String,

    pub phone: String,

    pub photo_url: Option<String>,

    pub bio: Option<String>,

    #[serde(skip_serializing)]
    pub hashed_password: String,

    #[serde(skip_serializing)]
    pub hashed_refresh_token: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Insert payload; the password must already be hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub email: String,
    pub phone: String,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub hashed_password: String,
}

/// Partial update; `None`/`Patch::Missing` leaves a column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Patch<String>,
    pub bio: Patch<String>,
    pub hashed_password: Option<String>,
    pub hashed_refresh_token: Patch<String>,
}

impl IntoColumns for NewUser {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set("first_name", self.first_name)
            .set("last_name", self.last_name)
            .set("role", self.role)
            .set("email", self.email)
            .set("phone", self.phone)
            .set("photo_url", self.photo_url)
            .set("bio", self.bio)
            .set("hashed_password", self.hashed_password)
    }
}

impl IntoColumns for UserChanges {
    fn into_columns(self) -> ColumnValues {
        ColumnValues::new()
            .set_some("first_name", self.first_name)
            .set_some("last_name", self.last_name)
            .set_some("role", self.role)
            .set_some("email", self.email)
            .set_some("phone", self.phone)
            .set_patch("photo_url", self.photo_url)
            .set_patch("bio", self.bio)
            .set_some("hashed_password", self.hashed_password)
            .set_patch("hashed_refresh_token", self.hashed_refresh_token)
    }
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const LABEL: &'static str = "User";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "first_name",
        "last_name",
        "role",
        "email",
        "phone",
        "photo_url",
        "bio",
        "hashed_password",
        "hashed_refresh_token",
        "created_at",
        "updated_at",
    ];
    const FILTERABLE: &'static [&'static str] = &["id", "email", "phone", "role"];
    const SEARCHABLE: &'static [&'static str] = &["first_name", "last_name", "email", "phone"];

    type New = NewUser;
    type Changes = UserChanges;

    fn id(&self) -> i64 {
        self.id
    }
}
