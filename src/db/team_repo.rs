// src/db/team_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    common::{db_utils::map_unique_violation, error::{AppError, Resource}},
    db::pg_store::PgTransaction,
    models::team::{MemberDetails, Membership, RosterEntry, ScrumRole, Team},
};

#[async_trait]
pub trait TeamRepository: Send {
    async fn team_name_exists(&mut self, name: &str) -> Result<bool, AppError>;
    async fn insert_team(&mut self, name: &str, project_id: Option<i64>) -> Result<Team, AppError>;
    async fn find_team(&mut self, id: i64) -> Result<Option<Team>, AppError>;
    async fn list_teams(&mut self) -> Result<Vec<Team>, AppError>;
    async fn update_team(&mut self, team: &Team) -> Result<Team, AppError>;
    async fn delete_team(&mut self, id: i64) -> Result<bool, AppError>;
    /// Referência fraca: as equipas do projeto ficam sem projeto.
    async fn unlink_project_teams(&mut self, project_id: i64) -> Result<u64, AppError>;

    async fn membership_exists(&mut self, team_id: i64, user_id: i64) -> Result<bool, AppError>;
    async fn insert_membership(
        &mut self,
        team_id: i64,
        user_id: i64,
        scrum_role: ScrumRole,
        joined_at: DateTime<Utc>,
    ) -> Result<Membership, AppError>;
    async fn list_members(&mut self, team_id: i64) -> Result<Vec<MemberDetails>, AppError>;
    async fn delete_membership(&mut self, team_id: i64, user_id: i64) -> Result<bool, AppError>;
    async fn delete_memberships_of_team(&mut self, team_id: i64) -> Result<u64, AppError>;
    async fn delete_memberships_of_user(&mut self, user_id: i64) -> Result<u64, AppError>;

    /// Membros das equipas ligadas a projetos do curso, para a pauta.
    async fn course_roster(&mut self, course_id: i64) -> Result<Vec<RosterEntry>, AppError>;
}

#[async_trait]
impl TeamRepository for PgTransaction {
    async fn team_name_exists(&mut self, name: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM teams WHERE name = $1)")
            .bind(name)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(exists)
    }

    async fn insert_team(&mut self, name: &str, project_id: Option<i64>) -> Result<Team, AppError> {
        sqlx::query_as::<_, Team>("INSERT INTO teams (name, project_id) VALUES ($1, $2) RETURNING id, name, project_id")
            .bind(name)
            .bind(project_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_unique_violation(e, || AppError::DuplicateName))
    }

    async fn find_team(&mut self, id: i64) -> Result<Option<Team>, AppError> {
        let team = sqlx::query_as::<_, Team>("SELECT id, name, project_id FROM teams WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(team)
    }

    async fn list_teams(&mut self) -> Result<Vec<Team>, AppError> {
        let teams = sqlx::query_as::<_, Team>("SELECT id, name, project_id FROM teams ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(teams)
    }

    async fn update_team(&mut self, team: &Team) -> Result<Team, AppError> {
        sqlx::query_as::<_, Team>(
            "UPDATE teams SET name = $2, project_id = $3 WHERE id = $1 RETURNING id, name, project_id",
        )
        .bind(team.id)
        .bind(&team.name)
        .bind(team.project_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::DuplicateName))?
        .ok_or(AppError::NotFound(Resource::Equipa))
    }

    async fn delete_team(&mut self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn unlink_project_teams(&mut self, project_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE teams SET project_id = NULL WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn membership_exists(&mut self, team_id: i64, user_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM team_members WHERE team_id = $1 AND user_id = $2)",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn insert_membership(
        &mut self,
        team_id: i64,
        user_id: i64,
        scrum_role: ScrumRole,
        joined_at: DateTime<Utc>,
    ) -> Result<Membership, AppError> {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO team_members (team_id, user_id, scrum_role, joined_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, team_id, user_id, scrum_role, joined_at
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .bind(scrum_role)
        .bind(joined_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::AlreadyMember))
    }

    async fn list_members(&mut self, team_id: i64) -> Result<Vec<MemberDetails>, AppError> {
        let members = sqlx::query_as::<_, MemberDetails>(
            r#"
            SELECT m.id, m.user_id, u.name AS user_name, u.email AS user_email, m.scrum_role, m.joined_at
            FROM team_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.team_id = $1
            ORDER BY m.id
            "#,
        )
        .bind(team_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(members)
    }

    async fn delete_membership(&mut self, team_id: i64, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_memberships_of_team(&mut self, team_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1")
            .bind(team_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_memberships_of_user(&mut self, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM team_members WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn course_roster(&mut self, course_id: i64) -> Result<Vec<RosterEntry>, AppError> {
        let roster = sqlx::query_as::<_, RosterEntry>(
            r#"
            SELECT u.id AS user_id, u.name AS user_name, u.email AS user_email,
                   t.name AS team_name, p.name AS project_name, s.total_points
            FROM projects p
            JOIN teams t ON t.project_id = p.id
            JOIN team_members m ON m.team_id = t.id
            JOIN users u ON u.id = m.user_id
            LEFT JOIN students s ON s.user_id = u.id
            WHERE p.course_id = $1
            ORDER BY p.id, t.id, m.id
            "#,
        )
        .bind(course_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(roster)
    }
}
