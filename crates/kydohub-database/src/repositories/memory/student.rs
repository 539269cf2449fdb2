use async_trait::async_trait;

use kydohub_core::result::AppResult;
use kydohub_core::types::scope::{ROOM_FIELD, STUDENT_FIELD};
use kydohub_core::types::{DataScope, TenantId};
use kydohub_entity::student::Student;

use super::MemoryDatabase;
use crate::repositories::StudentRepository;

#[async_trait]
impl StudentRepository for MemoryDatabase {
    async fn list(&self, tenant_id: TenantId, scope: &DataScope) -> AppResult<Vec<Student>> {
        let state = self.state.lock().await;
        let mut visible: Vec<_> = state
            .students
            .values()
            .filter(|s| {
                s.tenant_id == tenant_id
                    && scope.matches(|field| match field {
                        ROOM_FIELD => Some(s.room_id.as_str()),
                        STUDENT_FIELD => Some(s.id.as_str()),
                        _ => None,
                    })
            })
            .cloned()
            .collect();
        visible.sort_by(|a, b| (&a.full_name, &a.id).cmp(&(&b.full_name, &b.id)));
        Ok(visible)
    }

    async fn upsert(&self, student: &Student) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state
            .students
            .insert((student.tenant_id, student.id.clone()), student.clone());
        Ok(())
    }
}
