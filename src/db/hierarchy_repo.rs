// src/db/hierarchy_repo.rs

use async_trait::async_trait;

use crate::{
    common::{
        db_utils::{duplicate_course_code, duplicate_discipline_code, map_unique_violation},
        error::{AppError, Resource},
    },
    db::pg_store::PgTransaction,
    models::hierarchy::{Course, Discipline, Project, ProjectFields, Sprint, SprintFields},
};

/// Cursos, disciplinas, projetos, sprints e a associação professor-curso.
///
/// Os `delete_*` só apagam a própria linha; as cascatas são feitas
/// explicitamente pelo serviço, dentro da mesma transação.
#[async_trait]
pub trait HierarchyRepository: Send {
    // --- Cursos ---
    async fn course_code_exists(&mut self, code: &str) -> Result<bool, AppError>;
    async fn insert_course(&mut self, name: &str, code: &str, admin_id: Option<i64>) -> Result<Course, AppError>;
    async fn find_course(&mut self, id: i64) -> Result<Option<Course>, AppError>;
    async fn list_courses(&mut self) -> Result<Vec<Course>, AppError>;
    async fn update_course(&mut self, course: &Course) -> Result<Course, AppError>;
    async fn delete_course(&mut self, id: i64) -> Result<bool, AppError>;
    /// Referência fraca: os cursos do admin ficam sem admin.
    async fn clear_course_admin(&mut self, admin_id: i64) -> Result<u64, AppError>;

    // --- Professor <-> Curso ---
    async fn professor_has_course(&mut self, professor_id: i64) -> Result<bool, AppError>;
    async fn insert_professor_course(&mut self, professor_id: i64, course_id: i64) -> Result<(), AppError>;
    async fn list_professor_courses(&mut self, professor_id: i64) -> Result<Vec<Course>, AppError>;
    async fn delete_professor_course(&mut self, professor_id: i64, course_id: i64) -> Result<bool, AppError>;
    async fn delete_professor_courses_of_course(&mut self, course_id: i64) -> Result<u64, AppError>;
    async fn delete_professor_courses_of_professor(&mut self, professor_id: i64) -> Result<u64, AppError>;

    // --- Disciplinas ---
    async fn discipline_code_exists(&mut self, code: &str) -> Result<bool, AppError>;
    async fn insert_discipline(&mut self, course_id: i64, name: &str, code: &str) -> Result<Discipline, AppError>;
    async fn find_discipline(&mut self, id: i64) -> Result<Option<Discipline>, AppError>;
    async fn list_disciplines(&mut self, course_id: i64) -> Result<Vec<Discipline>, AppError>;
    async fn update_discipline(&mut self, discipline: &Discipline) -> Result<Discipline, AppError>;
    async fn delete_discipline(&mut self, id: i64) -> Result<bool, AppError>;

    // --- Projetos ---
    async fn insert_project(&mut self, course_id: i64, fields: &ProjectFields) -> Result<Project, AppError>;
    async fn find_project(&mut self, id: i64) -> Result<Option<Project>, AppError>;
    async fn list_projects(&mut self, course_id: i64) -> Result<Vec<Project>, AppError>;
    async fn update_project(&mut self, id: i64, fields: &ProjectFields) -> Result<Project, AppError>;
    async fn delete_project(&mut self, id: i64) -> Result<bool, AppError>;

    // --- Sprints ---
    async fn insert_sprint(&mut self, project_id: i64, fields: &SprintFields) -> Result<Sprint, AppError>;
    async fn list_sprints(&mut self, project_id: i64) -> Result<Vec<Sprint>, AppError>;
    async fn delete_sprint(&mut self, id: i64) -> Result<bool, AppError>;
    async fn delete_sprints_of_project(&mut self, project_id: i64) -> Result<u64, AppError>;
}

#[async_trait]
impl HierarchyRepository for PgTransaction {
    async fn course_code_exists(&mut self, code: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM courses WHERE code = $1)")
            .bind(code)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(exists)
    }

    async fn insert_course(&mut self, name: &str, code: &str, admin_id: Option<i64>) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(
            "INSERT INTO courses (name, code, admin_id) VALUES ($1, $2, $3) RETURNING id, name, code, admin_id",
        )
        .bind(name)
        .bind(code)
        .bind(admin_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_unique_violation(e, || duplicate_course_code(code)))
    }

    async fn find_course(&mut self, id: i64) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>("SELECT id, name, code, admin_id FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(course)
    }

    async fn list_courses(&mut self) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>("SELECT id, name, code, admin_id FROM courses ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(courses)
    }

    async fn update_course(&mut self, course: &Course) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses SET name = $2, code = $3, admin_id = $4
            WHERE id = $1
            RETURNING id, name, code, admin_id
            "#,
        )
        .bind(course.id)
        .bind(&course.name)
        .bind(&course.code)
        .bind(course.admin_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_unique_violation(e, || duplicate_course_code(&course.code)))?
        .ok_or(AppError::NotFound(Resource::Curso))
    }

    async fn delete_course(&mut self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_course_admin(&mut self, admin_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE courses SET admin_id = NULL WHERE admin_id = $1")
            .bind(admin_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn professor_has_course(&mut self, professor_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM professor_courses WHERE professor_id = $1)",
        )
        .bind(professor_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn insert_professor_course(&mut self, professor_id: i64, course_id: i64) -> Result<(), AppError> {
        sqlx::query("INSERT INTO professor_courses (professor_id, course_id) VALUES ($1, $2)")
            .bind(professor_id)
            .bind(course_id)
            .execute(&mut *self.tx)
            .await
            // O índice único em professor_id garante "no máximo um curso" mesmo com pedidos concorrentes
            .map_err(|e| map_unique_violation(e, || AppError::ProfessorAlreadyAssigned))?;
        Ok(())
    }

    async fn list_professor_courses(&mut self, professor_id: i64) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT c.id, c.name, c.code, c.admin_id
            FROM professor_courses pc
            JOIN courses c ON c.id = pc.course_id
            WHERE pc.professor_id = $1
            ORDER BY pc.id
            "#,
        )
        .bind(professor_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(courses)
    }

    async fn delete_professor_course(&mut self, professor_id: i64, course_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM professor_courses WHERE professor_id = $1 AND course_id = $2")
            .bind(professor_id)
            .bind(course_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_professor_courses_of_course(&mut self, course_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM professor_courses WHERE course_id = $1")
            .bind(course_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_professor_courses_of_professor(&mut self, professor_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM professor_courses WHERE professor_id = $1")
            .bind(professor_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn discipline_code_exists(&mut self, code: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM disciplines WHERE code = $1)")
            .bind(code)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(exists)
    }

    async fn insert_discipline(&mut self, course_id: i64, name: &str, code: &str) -> Result<Discipline, AppError> {
        sqlx::query_as::<_, Discipline>(
            "INSERT INTO disciplines (course_id, name, code) VALUES ($1, $2, $3) RETURNING id, name, code, course_id",
        )
        .bind(course_id)
        .bind(name)
        .bind(code)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_unique_violation(e, || duplicate_discipline_code(code)))
    }

    async fn find_discipline(&mut self, id: i64) -> Result<Option<Discipline>, AppError> {
        let discipline = sqlx::query_as::<_, Discipline>(
            "SELECT id, name, code, course_id FROM disciplines WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(discipline)
    }

    async fn list_disciplines(&mut self, course_id: i64) -> Result<Vec<Discipline>, AppError> {
        let disciplines = sqlx::query_as::<_, Discipline>(
            "SELECT id, name, code, course_id FROM disciplines WHERE course_id = $1 ORDER BY id",
        )
        .bind(course_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(disciplines)
    }

    async fn update_discipline(&mut self, discipline: &Discipline) -> Result<Discipline, AppError> {
        sqlx::query_as::<_, Discipline>(
            "UPDATE disciplines SET name = $2, code = $3 WHERE id = $1 RETURNING id, name, code, course_id",
        )
        .bind(discipline.id)
        .bind(&discipline.name)
        .bind(&discipline.code)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_unique_violation(e, || duplicate_discipline_code(&discipline.code)))?
        .ok_or(AppError::NotFound(Resource::Disciplina))
    }

    async fn delete_discipline(&mut self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM disciplines WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_project(&mut self, course_id: i64, fields: &ProjectFields) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (course_id, name, description, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, start_date, end_date, course_id
            "#,
        )
        .bind(course_id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(project)
    }

    async fn find_project(&mut self, id: i64) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT id, name, description, start_date, end_date, course_id FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(project)
    }

    async fn list_projects(&mut self, course_id: i64) -> Result<Vec<Project>, AppError> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, start_date, end_date, course_id
            FROM projects WHERE course_id = $1 ORDER BY id
            "#,
        )
        .bind(course_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(projects)
    }

    async fn update_project(&mut self, id: i64, fields: &ProjectFields) -> Result<Project, AppError> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects SET name = $2, description = $3, start_date = $4, end_date = $5
            WHERE id = $1
            RETURNING id, name, description, start_date, end_date, course_id
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(AppError::NotFound(Resource::Projeto))
    }

    async fn delete_project(&mut self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_sprint(&mut self, project_id: i64, fields: &SprintFields) -> Result<Sprint, AppError> {
        let sprint = sqlx::query_as::<_, Sprint>(
            r#"
            INSERT INTO sprints (project_id, name, objectives, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, objectives, start_date, end_date, project_id
            "#,
        )
        .bind(project_id)
        .bind(&fields.name)
        .bind(&fields.objectives)
        .bind(fields.start_date)
        .bind(fields.end_date)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(sprint)
    }

    async fn list_sprints(&mut self, project_id: i64) -> Result<Vec<Sprint>, AppError> {
        let sprints = sqlx::query_as::<_, Sprint>(
            r#"
            SELECT id, name, objectives, start_date, end_date, project_id
            FROM sprints WHERE project_id = $1 ORDER BY id
            "#,
        )
        .bind(project_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(sprints)
    }

    async fn delete_sprint(&mut self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sprints WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_sprints_of_project(&mut self, project_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sprints WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }
}
