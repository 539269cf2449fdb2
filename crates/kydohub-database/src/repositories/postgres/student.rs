//! Student repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use kydohub_core::result::AppResult;
use kydohub_core::types::scope::{ROOM_FIELD, STUDENT_FIELD};
use kydohub_core::types::{DataScope, TenantId};
use kydohub_entity::student::Student;

use super::db_err;
use crate::repositories::StudentRepository;

/// Physical column behind a logical scope field of the students table.
fn column_for(field: &str) -> Option<&'static str> {
    match field {
        ROOM_FIELD => Some("room_id"),
        STUDENT_FIELD => Some("id"),
        _ => None,
    }
}

/// Append `tenant_id = $n` and the scope predicate to a query that already
/// ends in `WHERE `.
///
/// An empty scope, or a restricted scope naming only unknown fields,
/// renders `FALSE`.
pub(crate) fn push_scope(
    builder: &mut QueryBuilder<'_, Postgres>,
    tenant_id: TenantId,
    scope: &DataScope,
) {
    builder.push("tenant_id = ");
    builder.push_bind(tenant_id);
    match scope {
        DataScope::Unrestricted => {}
        DataScope::Empty => {
            builder.push(" AND FALSE");
        }
        DataScope::Restricted(filters) => {
            let predicates: Vec<_> = filters
                .iter()
                .filter_map(|(field, values)| column_for(field).map(|col| (col, values)))
                .collect();
            if predicates.is_empty() {
                builder.push(" AND FALSE");
                return;
            }
            builder.push(" AND (");
            for (i, (column, values)) in predicates.into_iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push(column);
                builder.push(" = ANY(");
                builder.push_bind(values.iter().cloned().collect::<Vec<String>>());
                builder.push(")");
            }
            builder.push(")");
        }
    }
}

/// PostgreSQL-backed student records.
#[derive(Debug, Clone)]
pub struct PgStudentRepository {
    pool: PgPool,
}

impl PgStudentRepository {
    /// Create a new student repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentRepository for PgStudentRepository {
    async fn list(&self, tenant_id: TenantId, scope: &DataScope) -> AppResult<Vec<Student>> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, tenant_id, full_name, room_id, created_at FROM students WHERE ",
        );
        push_scope(&mut builder, tenant_id, scope);
        builder.push(" ORDER BY full_name, id");

        builder
            .build_query_as::<Student>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to list students"))
    }

    async fn upsert(&self, student: &Student) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO students (tenant_id, id, full_name, room_id, created_at) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (tenant_id, id) DO UPDATE SET full_name = EXCLUDED.full_name, room_id = EXCLUDED.room_id",
        )
        .bind(student.tenant_id)
        .bind(&student.id)
        .bind(&student.full_name)
        .bind(&student.room_id)
        .bind(student.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to upsert student"))?;
        Ok(())
    }
}
