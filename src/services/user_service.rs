// src/services/user_service.rs

use std::sync::Arc;

use crate::{
    common::error::{AppError, Resource},
    db::{GamificationRepository, HierarchyRepository, Store, TeamRepository, UserRepository},
    models::auth::{Principal, Role},
};

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Principal>, AppError> {
        let mut tx = self.store.begin().await?;
        tx.list_users().await
    }

    /// Apaga o utilizador e tudo o que só existe por causa dele.
    ///
    /// Membros de equipa, conquistas e a associação professor-curso são apagados;
    /// os cursos que ele administrava ficam sem admin.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;

        let principal = tx
            .find_user_by_id(id)
            .await?
            .ok_or(AppError::NotFound(Resource::Utilizador))?;

        let memberships = tx.delete_memberships_of_user(id).await?;
        let achievements = match principal.role {
            Role::Aluno => tx.delete_achievements_of_student(id).await?,
            _ => 0,
        };
        tx.delete_professor_courses_of_professor(id).await?;
        let orphaned_courses = tx.clear_course_admin(id).await?;

        tx.delete_user(id).await?;
        tx.commit().await?;

        tracing::info!(
            user_id = id,
            memberships,
            achievements,
            orphaned_courses,
            "Utilizador eliminado"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        db::MemoryStore,
        models::{
            auth::NewPrincipal,
            gamification::{PrizeFields, PrizeKind},
            team::ScrumRole,
        },
    };

    async fn seed_user(store: &MemoryStore, email: &str, role: Role) -> Principal {
        let mut tx = store.begin().await.unwrap();
        let user = tx
            .insert_user(&NewPrincipal {
                name: email.into(),
                email: email.into(),
                password_hash: "hash".into(),
                role,
                department: None,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        user
    }

    #[tokio::test]
    async fn deleting_an_unknown_user_is_not_found() {
        let users = UserService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            users.delete(99).await,
            Err(AppError::NotFound(Resource::Utilizador))
        ));
    }

    #[tokio::test]
    async fn deleting_a_student_removes_memberships_and_achievements() {
        let store = MemoryStore::new();
        let student = seed_user(&store, "aluno@test.com", Role::Aluno).await;
        let admin = seed_user(&store, "admin@test.com", Role::Admin).await;

        let mut tx = store.begin().await.unwrap();
        let course = tx.insert_course("Informática", "LEI", Some(admin.id)).await.unwrap();
        let discipline = tx.insert_discipline(course.id, "ES", "ES1").await.unwrap();
        let prize = tx
            .insert_prize(
                discipline.id,
                &PrizeFields { name: "MVP".into(), description: None, points: 10, kind: PrizeKind::Manual },
            )
            .await
            .unwrap();
        tx.insert_achievement(prize.id, student.id, Utc::now()).await.unwrap();
        let team = tx.insert_team("Alfa", None).await.unwrap();
        tx.insert_membership(team.id, student.id, ScrumRole::Dev, Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let users = UserService::new(Arc::new(store.clone()));
        users.delete(student.id).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_user_by_id(student.id).await.unwrap().is_none());
        assert!(tx.list_members(team.id).await.unwrap().is_empty());
        assert!(tx.list_student_achievements(student.id).await.unwrap().is_empty());
        // A equipa continua a existir
        assert!(tx.find_team(team.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_an_admin_keeps_the_course_without_admin() {
        let store = MemoryStore::new();
        let admin = seed_user(&store, "admin@test.com", Role::Admin).await;

        let mut tx = store.begin().await.unwrap();
        let course = tx.insert_course("Informática", "LEI", Some(admin.id)).await.unwrap();
        tx.commit().await.unwrap();

        UserService::new(Arc::new(store.clone())).delete(admin.id).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let course = tx.find_course(course.id).await.unwrap().unwrap();
        assert_eq!(course.admin_id, None);
    }
}
