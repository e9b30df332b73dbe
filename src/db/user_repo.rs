use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    common::{
        db_utils::{map_points_out_of_range, map_unique_violation},
        error::{AppError, Resource},
    },
    db::pg_store::PgTransaction,
    models::auth::{NewPrincipal, Principal, PrincipalRow, Profile, Role},
};

// O repositório de utilizadores: tabela 'users' e as tabelas de especialização
// 'students' (pontos) e 'professors' (departamento).
#[async_trait]
pub trait UserRepository: Send {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<Principal>, AppError>;

    async fn find_user_by_id(&mut self, id: i64) -> Result<Option<Principal>, AppError>;

    async fn list_users(&mut self) -> Result<Vec<Principal>, AppError>;

    /// Insere o utilizador e, para aluno/professor, a linha de especialização.
    /// Email repetido falha com `DuplicateEmail`.
    async fn insert_user(&mut self, new_user: &NewPrincipal) -> Result<Principal, AppError>;

    /// Soma `delta` ao total do aluno e devolve o novo total.
    async fn add_points(&mut self, student_id: i64, delta: i32) -> Result<i32, AppError>;

    async fn delete_user(&mut self, id: i64) -> Result<bool, AppError>;
}

const SELECT_PRINCIPAL: &str = r#"
    SELECT u.id, u.name, u.email, u.password_hash, u.role, u.created_at,
           s.total_points, p.department
    FROM users u
    LEFT JOIN students s ON s.user_id = u.id
    LEFT JOIN professors p ON p.user_id = u.id
"#;

#[async_trait]
impl UserRepository for PgTransaction {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<Principal>, AppError> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!("{SELECT_PRINCIPAL} WHERE u.email = $1"))
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Principal::from))
    }

    async fn find_user_by_id(&mut self, id: i64) -> Result<Option<Principal>, AppError> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!("{SELECT_PRINCIPAL} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(Principal::from))
    }

    async fn list_users(&mut self) -> Result<Vec<Principal>, AppError> {
        let rows = sqlx::query_as::<_, PrincipalRow>(&format!("{SELECT_PRINCIPAL} ORDER BY u.id"))
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.into_iter().map(Principal::from).collect())
    }

    async fn insert_user(&mut self, new_user: &NewPrincipal) -> Result<Principal, AppError> {
        let (id, created_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id, created_at",
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .fetch_one(&mut *self.tx)
        .await
        // Converte erro de violação de chave única em um erro mais amigável
        .map_err(|e| map_unique_violation(e, || AppError::DuplicateEmail))?;

        let profile = match new_user.role {
            Role::Aluno => {
                sqlx::query("INSERT INTO students (user_id, total_points) VALUES ($1, 0)")
                    .bind(id)
                    .execute(&mut *self.tx)
                    .await?;
                Profile::Student { total_points: 0 }
            }
            Role::Professor => {
                sqlx::query("INSERT INTO professors (user_id, department) VALUES ($1, $2)")
                    .bind(id)
                    .bind(&new_user.department)
                    .execute(&mut *self.tx)
                    .await?;
                Profile::Professor { department: new_user.department.clone() }
            }
            Role::Admin => Profile::Admin,
        };

        Ok(Principal {
            id,
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            role: new_user.role,
            created_at,
            profile,
        })
    }

    async fn add_points(&mut self, student_id: i64, delta: i32) -> Result<i32, AppError> {
        // Incremento atómico no próprio UPDATE, sem ler-somar-escrever.
        sqlx::query_scalar::<_, i32>(
            "UPDATE students SET total_points = total_points + $2 WHERE user_id = $1 RETURNING total_points",
        )
        .bind(student_id)
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_points_out_of_range)?
        .ok_or(AppError::NotFound(Resource::Aluno))
    }

    async fn delete_user(&mut self, id: i64) -> Result<bool, AppError> {
        sqlx::query("DELETE FROM students WHERE user_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query("DELETE FROM professors WHERE user_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
