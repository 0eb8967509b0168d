// Persisted entities: select shapes, insert contracts and their status enums

use async_trait::async_trait;
use diesel::QueryResult;
use diesel_async::AsyncPgConnection;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::contract::ValidationError;
use crate::descriptor::EntityDescriptor;

/// Closed text enumeration stored as VARCHAR.
///
/// Generates `as_str`, `VALUES` (consumed by the entity descriptors),
/// `FromStr`, `Display`, serde and Diesel text conversions.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            diesel::expression::AsExpression,
            diesel::deserialize::FromSqlRow,
        )]
        #[diesel(sql_type = diesel::sql_types::Text)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                value.parse().map_err(serde::de::Error::custom)
            }
        }

        impl<DB> diesel::deserialize::FromSql<diesel::sql_types::Text, DB> for $name
        where
            DB: diesel::backend::Backend,
            String: diesel::deserialize::FromSql<diesel::sql_types::Text, DB>,
        {
            fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
                let value = String::from_sql(bytes)?;
                value.parse().map_err(|e: String| e.into())
            }
        }

        impl<DB> diesel::serialize::ToSql<diesel::sql_types::Text, DB> for $name
        where
            DB: diesel::backend::Backend,
            str: diesel::serialize::ToSql<diesel::sql_types::Text, DB>,
        {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, DB>,
            ) -> diesel::serialize::Result {
                self.as_str().to_sql(out)
            }
        }
    };
}

/// Wires a select struct, its insert contract, Diesel table and descriptor
/// together as an [`Entity`].
macro_rules! impl_entity {
    (
        $row:ident,
        $new:ident,
        $table:ident,
        $descriptor:path,
        owner = $owner:ident,
        order = $order:ident
        $(, rules = $rules:path)?
        $(,)?
    ) => {
        #[async_trait::async_trait]
        impl $crate::models::Entity for $row {
            type Insert = $new;
            const DESCRIPTOR: &'static $crate::descriptor::EntityDescriptor = &$descriptor;

            fn id(&self) -> i32 {
                self.id
            }

            $(
                fn check_rules(
                    fields: &serde_json::Map<String, serde_json::Value>,
                    report: &mut $crate::contract::ValidationError,
                ) {
                    $rules(fields, report)
                }
            )?

            async fn pg_insert(
                conn: &mut diesel_async::AsyncPgConnection,
                new: &$new,
            ) -> diesel::QueryResult<Self> {
                use diesel::prelude::*;
                use diesel_async::RunQueryDsl;

                diesel::insert_into($crate::schema::$table::table)
                    .values(new)
                    .returning($row::as_returning())
                    .get_result(conn)
                    .await
            }

            async fn pg_find(
                conn: &mut diesel_async::AsyncPgConnection,
                row_id: i32,
            ) -> diesel::QueryResult<Option<Self>> {
                use diesel::prelude::*;
                use diesel_async::RunQueryDsl;

                $crate::schema::$table::table
                    .find(row_id)
                    .select($row::as_select())
                    .first(conn)
                    .await
                    .optional()
            }

            async fn pg_list(
                conn: &mut diesel_async::AsyncPgConnection,
            ) -> diesel::QueryResult<Vec<Self>> {
                use diesel::prelude::*;
                use diesel_async::RunQueryDsl;

                $crate::schema::$table::table
                    .select($row::as_select())
                    .order($crate::schema::$table::id.asc())
                    .load(conn)
                    .await
            }

            async fn pg_list_by_owner(
                conn: &mut diesel_async::AsyncPgConnection,
                owner_id: i32,
            ) -> diesel::QueryResult<Vec<Self>> {
                use diesel::prelude::*;
                use diesel_async::RunQueryDsl;

                $crate::schema::$table::table
                    .filter($crate::schema::$table::$owner.eq(owner_id))
                    .select($row::as_select())
                    .order($crate::schema::$table::$order.asc())
                    .then_order_by($crate::schema::$table::id.asc())
                    .load(conn)
                    .await
            }

            async fn pg_delete(
                conn: &mut diesel_async::AsyncPgConnection,
                row_id: i32,
            ) -> diesel::QueryResult<usize> {
                use diesel::prelude::*;
                use diesel_async::RunQueryDsl;

                diesel::delete($crate::schema::$table::table.find(row_id))
                    .execute(conn)
                    .await
            }
        }
    };
}

pub mod email;
pub mod funnel;
pub mod user;

pub use email::*;
pub use funnel::*;
pub use user::*;

/// A persisted entity: its select shape is `Self`, its insert contract
/// is `Self::Insert`, and `DESCRIPTOR` declares every column once.
#[async_trait]
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + Sized + 'static {
    type Insert: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    const DESCRIPTOR: &'static EntityDescriptor;

    fn id(&self) -> i32;

    /// Cross-field rules checked after every field passed on its own
    fn check_rules(_fields: &Map<String, Value>, _report: &mut ValidationError) {}

    async fn pg_insert(conn: &mut AsyncPgConnection, new: &Self::Insert) -> QueryResult<Self>;

    async fn pg_find(conn: &mut AsyncPgConnection, row_id: i32) -> QueryResult<Option<Self>>;

    async fn pg_list(conn: &mut AsyncPgConnection) -> QueryResult<Vec<Self>>;

    async fn pg_list_by_owner(
        conn: &mut AsyncPgConnection,
        owner_id: i32,
    ) -> QueryResult<Vec<Self>>;

    async fn pg_delete(conn: &mut AsyncPgConnection, row_id: i32) -> QueryResult<usize>;
}
