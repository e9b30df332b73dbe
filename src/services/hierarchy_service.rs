// src/services/hierarchy_service.rs
//
// Curso -> Disciplina / Projeto -> Sprint. Cada operação corre numa única
// transação: verificação do pai, unicidade e escrita são vistas como um todo.

use std::sync::Arc;

use crate::{
    common::{
        db_utils::duplicate_discipline_code,
        error::{AppError, Resource},
    },
    db::{GamificationRepository, HierarchyRepository, Store, TeamRepository, Transaction, UserRepository},
    models::{
        auth::Role,
        hierarchy::{Course, Discipline, Project, ProjectFields, Sprint, SprintFields},
    },
};

#[derive(Clone)]
pub struct HierarchyService {
    store: Arc<dyn Store>,
}

impl HierarchyService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // =========================================================================
    //  CURSOS
    // =========================================================================

    pub async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let mut tx = self.store.begin().await?;
        tx.list_courses().await
    }

    pub async fn get_course(&self, id: i64) -> Result<Course, AppError> {
        let mut tx = self.store.begin().await?;
        tx.find_course(id).await?.ok_or(AppError::NotFound(Resource::Curso))
    }

    pub async fn create_course(&self, name: &str, code: &str, admin_id: Option<i64>) -> Result<Course, AppError> {
        let mut tx = self.store.begin().await?;

        if tx.course_code_exists(code).await? {
            return Err(AppError::DuplicateCode(format!("Já existe um curso com o código: {}", code)));
        }
        let admin_id = admin_id.ok_or(AppError::AdminRequired)?;
        ensure_admin(tx.as_mut(), admin_id).await?;

        let course = tx.insert_course(name, code, Some(admin_id)).await?;
        tx.commit().await?;

        tracing::info!(curso_id = course.id, codigo = %course.code, "Curso criado");
        Ok(course)
    }

    /// `admin_id` ausente mantém o admin atual.
    pub async fn update_course(
        &self,
        id: i64,
        name: &str,
        code: &str,
        admin_id: Option<i64>,
    ) -> Result<Course, AppError> {
        let mut tx = self.store.begin().await?;

        let mut course = tx.find_course(id).await?.ok_or(AppError::NotFound(Resource::Curso))?;

        // Só compara com os outros cursos se o código mudou
        if course.code != code && tx.course_code_exists(code).await? {
            return Err(AppError::DuplicateCode("Código de curso já utilizado".to_string()));
        }

        if let Some(admin_id) = admin_id {
            ensure_admin(tx.as_mut(), admin_id).await?;
            course.admin_id = Some(admin_id);
        }
        course.name = name.to_string();
        course.code = code.to_string();

        let course = tx.update_course(&course).await?;
        tx.commit().await?;

        tracing::info!(curso_id = course.id, "Curso atualizado");
        Ok(course)
    }

    pub async fn delete_course(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;

        if tx.find_course(id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Curso));
        }

        for discipline in tx.list_disciplines(id).await? {
            purge_discipline(tx.as_mut(), discipline.id).await?;
        }
        for project in tx.list_projects(id).await? {
            purge_project(tx.as_mut(), project.id).await?;
        }
        tx.delete_professor_courses_of_course(id).await?;
        tx.delete_course(id).await?;
        tx.commit().await?;

        tracing::info!(curso_id = id, "Curso eliminado");
        Ok(())
    }

    // =========================================================================
    //  DISCIPLINAS
    // =========================================================================

    pub async fn create_discipline(&self, course_id: i64, name: &str, code: &str) -> Result<Discipline, AppError> {
        let mut tx = self.store.begin().await?;

        if tx.find_course(course_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Curso));
        }
        // Código de disciplina é único em todo o sistema, não só no curso
        if tx.discipline_code_exists(code).await? {
            return Err(duplicate_discipline_code(code));
        }

        let discipline = tx.insert_discipline(course_id, name, code).await?;
        tx.commit().await?;

        tracing::info!(curso_id = course_id, disciplina_id = discipline.id, "Disciplina criada");
        Ok(discipline)
    }

    pub async fn list_disciplines(&self, course_id: i64) -> Result<Vec<Discipline>, AppError> {
        let mut tx = self.store.begin().await?;
        if tx.find_course(course_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Curso));
        }
        tx.list_disciplines(course_id).await
    }

    pub async fn get_discipline(&self, id: i64) -> Result<Discipline, AppError> {
        let mut tx = self.store.begin().await?;
        tx.find_discipline(id)
            .await?
            .ok_or(AppError::NotFound(Resource::Disciplina))
    }

    pub async fn update_discipline(
        &self,
        course_id: i64,
        discipline_id: i64,
        name: &str,
        code: &str,
    ) -> Result<Discipline, AppError> {
        let mut tx = self.store.begin().await?;

        let mut discipline = find_discipline_in_course(tx.as_mut(), course_id, discipline_id).await?;

        if discipline.code != code && tx.discipline_code_exists(code).await? {
            return Err(duplicate_discipline_code(code));
        }
        discipline.name = name.to_string();
        discipline.code = code.to_string();

        let discipline = tx.update_discipline(&discipline).await?;
        tx.commit().await?;

        tracing::info!(disciplina_id = discipline.id, "Disciplina atualizada");
        Ok(discipline)
    }

    pub async fn delete_discipline(&self, course_id: i64, discipline_id: i64) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;

        find_discipline_in_course(tx.as_mut(), course_id, discipline_id).await?;
        purge_discipline(tx.as_mut(), discipline_id).await?;
        tx.commit().await?;

        tracing::info!(disciplina_id = discipline_id, "Disciplina eliminada");
        Ok(())
    }

    // =========================================================================
    //  PROJETOS
    // =========================================================================

    pub async fn create_project(&self, course_id: i64, fields: &ProjectFields) -> Result<Project, AppError> {
        let mut tx = self.store.begin().await?;

        if tx.find_course(course_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Curso));
        }
        let project = tx.insert_project(course_id, fields).await?;
        tx.commit().await?;

        tracing::info!(curso_id = course_id, projeto_id = project.id, "Projeto criado");
        Ok(project)
    }

    /// Cria o projeto no curso a que a disciplina pertence.
    pub async fn create_project_for_discipline(
        &self,
        discipline_id: i64,
        fields: &ProjectFields,
    ) -> Result<Project, AppError> {
        let mut tx = self.store.begin().await?;

        let discipline = tx
            .find_discipline(discipline_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Disciplina))?;
        let project = tx.insert_project(discipline.course_id, fields).await?;
        tx.commit().await?;

        tracing::info!(disciplina_id = discipline_id, projeto_id = project.id, "Projeto criado");
        Ok(project)
    }

    pub async fn list_projects(&self, course_id: i64) -> Result<Vec<Project>, AppError> {
        let mut tx = self.store.begin().await?;
        if tx.find_course(course_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Curso));
        }
        tx.list_projects(course_id).await
    }

    pub async fn list_discipline_projects(&self, discipline_id: i64) -> Result<Vec<Project>, AppError> {
        let mut tx = self.store.begin().await?;
        let discipline = tx
            .find_discipline(discipline_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Disciplina))?;
        tx.list_projects(discipline.course_id).await
    }

    pub async fn get_project(&self, id: i64) -> Result<Project, AppError> {
        let mut tx = self.store.begin().await?;
        tx.find_project(id).await?.ok_or(AppError::NotFound(Resource::Projeto))
    }

    pub async fn update_project(&self, id: i64, fields: &ProjectFields) -> Result<Project, AppError> {
        let mut tx = self.store.begin().await?;

        if tx.find_project(id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Projeto));
        }
        let project = tx.update_project(id, fields).await?;
        tx.commit().await?;

        tracing::info!(projeto_id = id, "Projeto atualizado");
        Ok(project)
    }

    pub async fn delete_project(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;

        if tx.find_project(id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Projeto));
        }
        purge_project(tx.as_mut(), id).await?;
        tx.commit().await?;

        tracing::info!(projeto_id = id, "Projeto eliminado");
        Ok(())
    }

    // =========================================================================
    //  SPRINTS
    // =========================================================================

    pub async fn create_sprint(&self, project_id: i64, fields: &SprintFields) -> Result<Sprint, AppError> {
        let mut tx = self.store.begin().await?;

        if tx.find_project(project_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Projeto));
        }
        let sprint = tx.insert_sprint(project_id, fields).await?;
        tx.commit().await?;

        tracing::info!(projeto_id = project_id, sprint_id = sprint.id, "Sprint criado");
        Ok(sprint)
    }

    pub async fn list_sprints(&self, project_id: i64) -> Result<Vec<Sprint>, AppError> {
        let mut tx = self.store.begin().await?;
        if tx.find_project(project_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Projeto));
        }
        tx.list_sprints(project_id).await
    }

    pub async fn delete_sprint(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_sprint(id).await? {
            return Err(AppError::NotFound(Resource::Sprint));
        }
        tx.commit().await?;

        tracing::info!(sprint_id = id, "Sprint eliminado");
        Ok(())
    }
}

/// O id tem de ser de um utilizador com papel ADMIN.
async fn ensure_admin(tx: &mut dyn Transaction, admin_id: i64) -> Result<(), AppError> {
    match tx.find_user_by_id(admin_id).await? {
        Some(user) if user.role == Role::Admin => Ok(()),
        _ => Err(AppError::AdminNotFound(admin_id)),
    }
}

async fn find_discipline_in_course(
    tx: &mut dyn Transaction,
    course_id: i64,
    discipline_id: i64,
) -> Result<Discipline, AppError> {
    if tx.find_course(course_id).await?.is_none() {
        return Err(AppError::NotFound(Resource::Curso));
    }
    tx.find_discipline(discipline_id)
        .await?
        .filter(|d| d.course_id == course_id)
        .ok_or(AppError::NotFound(Resource::Disciplina))
}

/// Apaga a disciplina, os seus prémios e as conquistas desses prémios.
/// Os pontos dessas conquistas são retirados aos alunos.
pub(crate) async fn purge_discipline(tx: &mut dyn Transaction, discipline_id: i64) -> Result<(), AppError> {
    for prize in tx.list_prizes(discipline_id).await? {
        // Uma correção por conquista realmente apagada
        for student_id in tx.take_achievements_of_prize(prize.id).await? {
            tx.add_points(student_id, -prize.points).await?;
        }
        tx.delete_prize(prize.id).await?;
    }
    tx.delete_discipline(discipline_id).await?;
    Ok(())
}

/// Apaga o projeto e os seus sprints. As equipas ficam sem projeto.
async fn purge_project(tx: &mut dyn Transaction, project_id: i64) -> Result<(), AppError> {
    tx.delete_sprints_of_project(project_id).await?;
    tx.unlink_project_teams(project_id).await?;
    tx.delete_project(project_id).await?;
    Ok(())
}
