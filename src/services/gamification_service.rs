// src/services/gamification_service.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    common::error::{AppError, Resource},
    db::{GamificationRepository, HierarchyRepository, Store, UserRepository},
    models::{
        auth::Role,
        gamification::{Achievement, AchievementDetails, Prize, PrizeFields, PrizeKind},
    },
};

#[derive(Clone)]
pub struct GamificationService {
    store: Arc<dyn Store>,
}

impl GamificationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Cria um prémio na disciplina. `kind` tem de ser MANUAL ou AUTOMATICO.
    pub async fn create_prize(
        &self,
        discipline_id: i64,
        name: &str,
        description: Option<&str>,
        points: i32,
        kind: &str,
    ) -> Result<Prize, AppError> {
        let mut tx = self.store.begin().await?;

        if tx.find_discipline(discipline_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Disciplina));
        }
        let kind: PrizeKind = kind.parse()?;

        let fields = PrizeFields {
            name: name.to_string(),
            description: description.map(str::to_owned),
            points,
            kind,
        };
        let prize = tx.insert_prize(discipline_id, &fields).await?;
        tx.commit().await?;

        tracing::info!(disciplina_id = discipline_id, premio_id = prize.id, pontos = points, "Prémio criado");
        Ok(prize)
    }

    pub async fn list_prizes(&self, discipline_id: i64) -> Result<Vec<Prize>, AppError> {
        let mut tx = self.store.begin().await?;
        if tx.find_discipline(discipline_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Disciplina));
        }
        tx.list_prizes(discipline_id).await
    }

    /// Atribui o prémio ao aluno.
    ///
    /// A conquista e o incremento do total do aluno estão na mesma transação:
    /// se qualquer um falhar, nenhum dos dois fica gravado.
    pub async fn award(&self, prize_id: i64, student_id: i64) -> Result<Achievement, AppError> {
        let mut tx = self.store.begin().await?;

        let prize = tx
            .find_prize(prize_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Premio))?;

        match tx.find_user_by_id(student_id).await? {
            Some(user) if user.role == Role::Aluno => {}
            _ => return Err(AppError::NotFound(Resource::Aluno)),
        }

        let achievement = tx.insert_achievement(prize.id, student_id, Utc::now()).await?;
        let total = tx.add_points(student_id, prize.points).await?;
        tx.commit().await?;

        tracing::info!(
            premio_id = prize.id,
            aluno_id = student_id,
            pontos = prize.points,
            total,
            "Prémio atribuído"
        );
        Ok(achievement)
    }

    pub async fn list_achievements(&self, student_id: i64) -> Result<Vec<AchievementDetails>, AppError> {
        let mut tx = self.store.begin().await?;
        match tx.find_user_by_id(student_id).await? {
            Some(user) if user.role == Role::Aluno => tx.list_student_achievements(student_id).await,
            _ => Err(AppError::NotFound(Resource::Aluno)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{memory_store::Fault, MemoryStore},
        models::auth::{NewPrincipal, Principal},
    };

    struct Fixture {
        store: MemoryStore,
        service: GamificationService,
        student: Principal,
        discipline_id: i64,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let student = tx
            .insert_user(&NewPrincipal {
                name: "Joao".into(),
                email: "joao@test.com".into(),
                password_hash: "hash".into(),
                role: Role::Aluno,
                department: None,
            })
            .await
            .unwrap();
        let course = tx.insert_course("Informática", "LEI", None).await.unwrap();
        let discipline = tx.insert_discipline(course.id, "ES", "ES1").await.unwrap();
        tx.commit().await.unwrap();

        Fixture {
            service: GamificationService::new(Arc::new(store.clone())),
            store,
            student,
            discipline_id: discipline.id,
        }
    }

    async fn total_points(store: &MemoryStore, student_id: i64) -> i32 {
        let mut tx = store.begin().await.unwrap();
        let user = tx.find_user_by_id(student_id).await.unwrap().unwrap();
        user.total_points().unwrap()
    }

    #[tokio::test]
    async fn awarding_adds_the_prize_value_and_one_achievement() {
        let f = fixture().await;
        let prize = f
            .service
            .create_prize(f.discipline_id, "MVP", Some("Melhor sprint"), 15, "MANUAL")
            .await
            .unwrap();

        f.service.award(prize.id, f.student.id).await.unwrap();
        assert_eq!(total_points(&f.store, f.student.id).await, 15);

        // Atribuir de novo é permitido e acumula
        f.service.award(prize.id, f.student.id).await.unwrap();
        assert_eq!(total_points(&f.store, f.student.id).await, 30);

        let achievements = f.service.list_achievements(f.student.id).await.unwrap();
        assert_eq!(achievements.len(), 2);
        assert_eq!(achievements[0].prize_name, "MVP");
        assert_eq!(achievements[0].points, 15);
    }

    #[tokio::test]
    async fn failing_point_increment_rolls_back_the_achievement() {
        let f = fixture().await;
        let prize = f
            .service
            .create_prize(f.discipline_id, "MVP", None, 10, "MANUAL")
            .await
            .unwrap();
        f.service.award(prize.id, f.student.id).await.unwrap();

        f.store.inject_fault(Fault::AddPoints);
        let result = f.service.award(prize.id, f.student.id).await;
        assert!(matches!(result, Err(AppError::DatabaseError(_))));

        assert_eq!(total_points(&f.store, f.student.id).await, 10);
        assert_eq!(f.service.list_achievements(f.student.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_commit_leaves_nothing_behind() {
        let f = fixture().await;
        let prize = f
            .service
            .create_prize(f.discipline_id, "MVP", None, 10, "AUTOMATICO")
            .await
            .unwrap();

        f.store.inject_fault(Fault::Commit);
        assert!(f.service.award(prize.id, f.student.id).await.is_err());

        assert_eq!(total_points(&f.store, f.student.id).await, 0);
        assert!(f.service.list_achievements(f.student.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_achievement_insert_leaves_points_untouched() {
        let f = fixture().await;
        let prize = f
            .service
            .create_prize(f.discipline_id, "MVP", None, 10, "MANUAL")
            .await
            .unwrap();

        f.store.inject_fault(Fault::InsertAchievement);
        assert!(f.service.award(prize.id, f.student.id).await.is_err());
        assert_eq!(total_points(&f.store, f.student.id).await, 0);
    }

    #[tokio::test]
    async fn award_that_would_overflow_the_total_is_refused_and_rolled_back() {
        let f = fixture().await;
        let prize = f
            .service
            .create_prize(f.discipline_id, "Lenda", None, i32::MAX, "MANUAL")
            .await
            .unwrap();

        f.service.award(prize.id, f.student.id).await.unwrap();
        assert!(matches!(
            f.service.award(prize.id, f.student.id).await,
            Err(AppError::PointsOutOfRange)
        ));

        assert_eq!(total_points(&f.store, f.student.id).await, i32::MAX);
        assert_eq!(f.service.list_achievements(f.student.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn award_requires_prize_and_student() {
        let f = fixture().await;
        let prize = f
            .service
            .create_prize(f.discipline_id, "MVP", None, 10, "MANUAL")
            .await
            .unwrap();

        assert!(matches!(
            f.service.award(999, f.student.id).await,
            Err(AppError::NotFound(Resource::Premio))
        ));
        assert!(matches!(
            f.service.award(prize.id, 999).await,
            Err(AppError::NotFound(Resource::Aluno))
        ));
    }

    #[tokio::test]
    async fn prize_needs_a_discipline_and_a_known_kind() {
        let f = fixture().await;

        assert!(matches!(
            f.service.create_prize(999, "MVP", None, 10, "MANUAL").await,
            Err(AppError::NotFound(Resource::Disciplina))
        ));
        assert!(matches!(
            f.service.create_prize(f.discipline_id, "MVP", None, 10, "BONUS").await,
            Err(AppError::Validation(_))
        ));

        f.service
            .create_prize(f.discipline_id, "Bug hunter", None, 5, "AUTOMATICO")
            .await
            .unwrap();
        let prizes = f.service.list_prizes(f.discipline_id).await.unwrap();
        assert_eq!(prizes.len(), 1);
        assert_eq!(prizes[0].kind, PrizeKind::Automatico);
    }
}
