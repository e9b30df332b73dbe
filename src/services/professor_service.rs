// src/services/professor_service.rs

use std::sync::Arc;

use crate::{
    common::error::{AppError, Resource},
    db::{HierarchyRepository, Store, TeamRepository, UserRepository},
    models::{auth::Role, hierarchy::Course, team::RosterEntry},
};

const CSV_HEADER: &str = "id,nome,email,equipa,projeto,pontos";

#[derive(Clone)]
pub struct ProfessorService {
    store: Arc<dyn Store>,
}

impl ProfessorService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Associa o professor ao curso. Um professor tem no máximo um curso.
    pub async fn assign(&self, professor_id: i64, course_id: i64) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;

        let professor = tx
            .find_user_by_id(professor_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Professor))?;
        if professor.role != Role::Professor {
            return Err(AppError::Forbidden("Utilizador não é um professor.".to_string()));
        }

        if tx.find_course(course_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Curso));
        }
        if tx.professor_has_course(professor_id).await? {
            return Err(AppError::ProfessorAlreadyAssigned);
        }

        tx.insert_professor_course(professor_id, course_id).await?;
        tx.commit().await?;

        tracing::info!(professor_id, curso_id = course_id, "Professor associado ao curso");
        Ok(())
    }

    pub async fn list_courses(&self, professor_id: i64) -> Result<Vec<Course>, AppError> {
        let mut tx = self.store.begin().await?;
        tx.list_professor_courses(professor_id).await
    }

    pub async fn unassign(&self, professor_id: i64, course_id: i64) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_professor_course(professor_id, course_id).await? {
            return Err(AppError::NotFound(Resource::AssociacaoProfessorCurso));
        }
        tx.commit().await?;

        tracing::info!(professor_id, curso_id = course_id, "Professor desassociado do curso");
        Ok(())
    }

    /// Pauta do curso em CSV: uma linha por membro de equipa de um projeto do curso.
    pub async fn export_grades(&self, course_id: i64) -> Result<String, AppError> {
        let mut tx = self.store.begin().await?;

        if tx.find_course(course_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Curso));
        }
        let roster = tx.course_roster(course_id).await?;

        tracing::debug!(curso_id = course_id, linhas = roster.len(), "Pauta exportada");
        Ok(render_csv(&roster))
    }
}

fn render_csv(roster: &[RosterEntry]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for entry in roster {
        let fields = [
            entry.user_id.to_string(),
            csv_field(&entry.user_name),
            csv_field(&entry.user_email),
            csv_field(&entry.team_name),
            csv_field(&entry.project_name),
            entry.total_points.unwrap_or(0).to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

// Aspas só quando o valor tem separador, aspas ou quebra de linha
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        db::MemoryStore,
        models::{
            auth::{NewPrincipal, Principal},
            hierarchy::ProjectFields,
            team::ScrumRole,
        },
    };

    async fn seed_user(store: &MemoryStore, name: &str, role: Role) -> Principal {
        let mut tx = store.begin().await.unwrap();
        let user = tx
            .insert_user(&NewPrincipal {
                name: name.into(),
                email: format!("{}@test.com", name.to_lowercase()),
                password_hash: "hash".into(),
                role,
                department: None,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        user
    }

    async fn seed_course(store: &MemoryStore, code: &str) -> Course {
        let mut tx = store.begin().await.unwrap();
        let course = tx.insert_course(code, code, None).await.unwrap();
        tx.commit().await.unwrap();
        course
    }

    #[tokio::test]
    async fn professor_is_associated_with_at_most_one_course() {
        let store = MemoryStore::new();
        let prof = seed_user(&store, "Carlos", Role::Professor).await;
        let lei = seed_course(&store, "LEI").await;
        let meec = seed_course(&store, "MEEC").await;
        let service = ProfessorService::new(Arc::new(store));

        service.assign(prof.id, lei.id).await.unwrap();
        let second = service.assign(prof.id, meec.id).await;
        assert!(matches!(second, Err(AppError::ProfessorAlreadyAssigned)));

        assert_eq!(service.list_courses(prof.id).await.unwrap(), vec![lei.clone()]);

        service.unassign(prof.id, lei.id).await.unwrap();
        service.assign(prof.id, meec.id).await.unwrap();
    }

    #[tokio::test]
    async fn only_professors_can_be_associated() {
        let store = MemoryStore::new();
        let student = seed_user(&store, "Joao", Role::Aluno).await;
        let lei = seed_course(&store, "LEI").await;
        let service = ProfessorService::new(Arc::new(store));

        assert!(matches!(service.assign(student.id, lei.id).await, Err(AppError::Forbidden(_))));
        assert!(matches!(
            service.assign(999, lei.id).await,
            Err(AppError::NotFound(Resource::Professor))
        ));
    }

    #[tokio::test]
    async fn removing_a_missing_association_is_not_found() {
        let service = ProfessorService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            service.unassign(1, 2).await,
            Err(AppError::NotFound(Resource::AssociacaoProfessorCurso))
        ));
    }

    #[tokio::test]
    async fn grade_export_lists_members_of_course_teams() {
        let store = MemoryStore::new();
        let joao = seed_user(&store, "Joao", Role::Aluno).await;
        let lei = seed_course(&store, "LEI").await;

        let mut tx = store.begin().await.unwrap();
        let fields = ProjectFields {
            name: "Awards, v2".into(),
            description: None,
            start_date: None,
            end_date: None,
        };
        let project = tx.insert_project(lei.id, &fields).await.unwrap();
        let team = tx.insert_team("Alfa", Some(project.id)).await.unwrap();
        tx.insert_membership(team.id, joao.id, ScrumRole::Dev, Utc::now())
            .await
            .unwrap();
        tx.add_points(joao.id, 30).await.unwrap();
        tx.commit().await.unwrap();

        let csv = ProfessorService::new(Arc::new(store)).export_grades(lei.id).await.unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            format!("{},Joao,joao@test.com,Alfa,\"Awards, v2\",30", joao.id)
        );
        assert_eq!(lines.len(), 2);
    }

    #[tokio::test]
    async fn grade_export_of_missing_course_is_not_found() {
        let service = ProfessorService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            service.export_grades(5).await,
            Err(AppError::NotFound(Resource::Curso))
        ));
    }
}
