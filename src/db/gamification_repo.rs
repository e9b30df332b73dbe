// src/db/gamification_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    common::error::AppError,
    db::pg_store::PgTransaction,
    models::gamification::{Achievement, AchievementDetails, Prize, PrizeFields},
};

#[async_trait]
pub trait GamificationRepository: Send {
    async fn insert_prize(&mut self, discipline_id: i64, fields: &PrizeFields) -> Result<Prize, AppError>;
    async fn find_prize(&mut self, id: i64) -> Result<Option<Prize>, AppError>;
    async fn list_prizes(&mut self, discipline_id: i64) -> Result<Vec<Prize>, AppError>;
    async fn delete_prize(&mut self, id: i64) -> Result<bool, AppError>;

    async fn insert_achievement(
        &mut self,
        prize_id: i64,
        student_id: i64,
        awarded_at: DateTime<Utc>,
    ) -> Result<Achievement, AppError>;
    async fn list_student_achievements(&mut self, student_id: i64) -> Result<Vec<AchievementDetails>, AppError>;
    /// Pontos atribuídos por um prémio, somados por aluno: `(aluno, pontos)`.
    /// Apaga as conquistas do prémio e devolve o aluno de cada linha apagada
    /// (repetido se o aluno o ganhou várias vezes).
    async fn take_achievements_of_prize(&mut self, prize_id: i64) -> Result<Vec<i64>, AppError>;
    async fn delete_achievements_of_student(&mut self, student_id: i64) -> Result<u64, AppError>;
}

#[async_trait]
impl GamificationRepository for PgTransaction {
    async fn insert_prize(&mut self, discipline_id: i64, fields: &PrizeFields) -> Result<Prize, AppError> {
        let prize = sqlx::query_as::<_, Prize>(
            r#"
            INSERT INTO prizes (discipline_id, name, description, points, kind)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, discipline_id, name, description, points, kind
            "#,
        )
        .bind(discipline_id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.points)
        .bind(fields.kind)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(prize)
    }

    async fn find_prize(&mut self, id: i64) -> Result<Option<Prize>, AppError> {
        let prize = sqlx::query_as::<_, Prize>(
            "SELECT id, discipline_id, name, description, points, kind FROM prizes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(prize)
    }

    async fn list_prizes(&mut self, discipline_id: i64) -> Result<Vec<Prize>, AppError> {
        let prizes = sqlx::query_as::<_, Prize>(
            r#"
            SELECT id, discipline_id, name, description, points, kind
            FROM prizes WHERE discipline_id = $1 ORDER BY id
            "#,
        )
        .bind(discipline_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(prizes)
    }

    async fn delete_prize(&mut self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM prizes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_achievement(
        &mut self,
        prize_id: i64,
        student_id: i64,
        awarded_at: DateTime<Utc>,
    ) -> Result<Achievement, AppError> {
        let achievement = sqlx::query_as::<_, Achievement>(
            r#"
            INSERT INTO achievements (prize_id, student_id, awarded_at)
            VALUES ($1, $2, $3)
            RETURNING id, prize_id, student_id, awarded_at
            "#,
        )
        .bind(prize_id)
        .bind(student_id)
        .bind(awarded_at)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(achievement)
    }

    async fn list_student_achievements(&mut self, student_id: i64) -> Result<Vec<AchievementDetails>, AppError> {
        let achievements = sqlx::query_as::<_, AchievementDetails>(
            r#"
            SELECT a.id, a.prize_id, p.name AS prize_name, p.points, p.kind, a.awarded_at
            FROM achievements a
            JOIN prizes p ON p.id = a.prize_id
            WHERE a.student_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(student_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(achievements)
    }

    async fn take_achievements_of_prize(&mut self, prize_id: i64) -> Result<Vec<i64>, AppError> {
        // As linhas devolvidas são exatamente as apagadas, mesmo com um
        // `award` concorrente a fazer commit entretanto.
        let students = sqlx::query_scalar::<_, i64>(
            "DELETE FROM achievements WHERE prize_id = $1 RETURNING student_id",
        )
        .bind(prize_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(students)
    }

    async fn delete_achievements_of_student(&mut self, student_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM achievements WHERE student_id = $1")
            .bind(student_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }
}
