//! Database models
//!
//! Each model implements [`crate::db::repository::Entity`] and defines its
//! insert payload (`New*`) and partial update payload (`*Changes`).
//!
//! Enumerated columns are stored as `TEXT` guarded by a `CHECK` constraint
//! and decoded into Rust enums with `#[sqlx(try_from = "String")]`.
//!
//! # Example
//!
//! ```no_run
//! use argus_shared::db::repository::Repository;
//! use argus_shared::models::task::{NewTask, Task, TaskPriority, TaskStatus};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let task = Repository::<Task>::new(pool)
//!     .create(NewTask {
//!         admin_id: 1,
//!         assigned_to: None,
//!         title: "Quarterly review".to_string(),
//!         description: None,
//!         status: TaskStatus::Pending,
//!         priority: TaskPriority::High,
//!         due_date: None,
//!     })
//!     .await?;
//! println!("created task {}", task.id);
//! # Ok(())
//! # }
//! ```

/// Returned when a stored or supplied string names no known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a string-backed enum with serde, sqlx and bind support
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::models::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::models::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl $crate::db::value::IntoSqlValue for $name {
            fn into_sql(self) -> $crate::db::value::SqlValue {
                $crate::db::value::SqlValue::Text(Some(self.as_str().to_string()))
            }

            fn sql_null() -> $crate::db::value::SqlValue {
                $crate::db::value::SqlValue::Text(None)
            }
        }
    };
}

pub mod attendance;
pub mod bonus;
pub mod file;
pub mod salary;
pub mod task;
pub mod user;

text_enum! {
    /// ISO 4217 codes accepted for salaries and bonuses
    Currency("currency") {
        Usd => "USD",
        Eur => "EUR",
        Gbp => "GBP",
    }
}
