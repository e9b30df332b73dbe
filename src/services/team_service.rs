// src/services/team_service.rs

use std::sync::Arc;

use chrono::Utc;

use crate::{
    common::error::{AppError, Resource},
    db::{HierarchyRepository, Store, TeamRepository, UserRepository},
    models::team::{MemberDetails, Membership, ProjectLink, ScrumRole, Team},
};

#[derive(Clone)]
pub struct TeamService {
    store: Arc<dyn Store>,
}

impl TeamService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Team>, AppError> {
        let mut tx = self.store.begin().await?;
        tx.list_teams().await
    }

    pub async fn get(&self, id: i64) -> Result<Team, AppError> {
        let mut tx = self.store.begin().await?;
        tx.find_team(id).await?.ok_or(AppError::NotFound(Resource::Equipa))
    }

    /// O nome é guardado sem espaços nas pontas, como no `update`.
    pub async fn create(&self, name: &str, project_id: Option<i64>) -> Result<Team, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("O nome da equipa é obrigatório.".into()));
        }
        let mut tx = self.store.begin().await?;

        if tx.team_name_exists(name).await? {
            return Err(AppError::DuplicateName);
        }
        if let Some(project_id) = project_id {
            if tx.find_project(project_id).await?.is_none() {
                return Err(AppError::NotFound(Resource::Projeto));
            }
        }

        let team = tx.insert_team(name, project_id).await?;
        tx.commit().await?;

        tracing::info!(equipa_id = team.id, projeto_id = ?team.project_id, "Equipa criada");
        Ok(team)
    }

    /// O nome só muda se vier preenchido e diferente; o projeto segue `link`.
    pub async fn update(&self, id: i64, name: Option<&str>, link: ProjectLink) -> Result<Team, AppError> {
        let mut tx = self.store.begin().await?;

        let mut team = tx.find_team(id).await?.ok_or(AppError::NotFound(Resource::Equipa))?;

        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            if name != team.name {
                if tx.team_name_exists(name).await? {
                    return Err(AppError::DuplicateName);
                }
                team.name = name.to_string();
            }
        }

        match link {
            ProjectLink::Keep => {}
            ProjectLink::Clear => team.project_id = None,
            ProjectLink::Set(project_id) => {
                if tx.find_project(project_id).await?.is_none() {
                    return Err(AppError::NotFound(Resource::Projeto));
                }
                team.project_id = Some(project_id);
            }
        }

        let team = tx.update_team(&team).await?;
        tx.commit().await?;

        tracing::info!(equipa_id = id, "Equipa atualizada");
        Ok(team)
    }

    /// Apaga a equipa e todos os seus membros.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;

        if tx.find_team(id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Equipa));
        }
        let members = tx.delete_memberships_of_team(id).await?;
        tx.delete_team(id).await?;
        tx.commit().await?;

        tracing::info!(equipa_id = id, membros = members, "Equipa eliminada");
        Ok(())
    }

    // =========================================================================
    //  MEMBROS
    // =========================================================================

    pub async fn list_members(&self, team_id: i64) -> Result<Vec<MemberDetails>, AppError> {
        let mut tx = self.store.begin().await?;
        if tx.find_team(team_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Equipa));
        }
        tx.list_members(team_id).await
    }

    /// O papel Scrum é guardado tal como vem (DEV por omissão).
    pub async fn add_member(
        &self,
        team_id: i64,
        user_id: i64,
        scrum_role: Option<ScrumRole>,
    ) -> Result<Membership, AppError> {
        let mut tx = self.store.begin().await?;

        if tx.find_team(team_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Equipa));
        }
        if tx.find_user_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Utilizador));
        }
        if tx.membership_exists(team_id, user_id).await? {
            return Err(AppError::AlreadyMember);
        }

        let membership = tx
            .insert_membership(team_id, user_id, scrum_role.unwrap_or(ScrumRole::Dev), Utc::now())
            .await?;
        tx.commit().await?;

        tracing::info!(equipa_id = team_id, user_id, papel = ?membership.scrum_role, "Membro adicionado");
        Ok(membership)
    }

    pub async fn remove_member(&self, team_id: i64, user_id: i64) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_membership(team_id, user_id).await? {
            return Err(AppError::NotFound(Resource::Membro));
        }
        tx.commit().await?;

        tracing::info!(equipa_id = team_id, user_id, "Membro removido");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::{
            auth::{NewPrincipal, Principal, Role},
            hierarchy::ProjectFields,
        },
    };

    async fn seed_user(store: &MemoryStore, email: &str) -> Principal {
        let mut tx = store.begin().await.unwrap();
        let user = tx
            .insert_user(&NewPrincipal {
                name: email.into(),
                email: email.into(),
                password_hash: "hash".into(),
                role: Role::Aluno,
                department: None,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        user
    }

    async fn seed_project(store: &MemoryStore) -> i64 {
        let mut tx = store.begin().await.unwrap();
        let course = tx.insert_course("Informática", "LEI", None).await.unwrap();
        let fields = ProjectFields { name: "P".into(), description: None, start_date: None, end_date: None };
        let project = tx.insert_project(course.id, &fields).await.unwrap();
        tx.commit().await.unwrap();
        project.id
    }

    #[tokio::test]
    async fn create_and_update_trim_the_name_the_same_way() {
        let service = TeamService::new(Arc::new(MemoryStore::new()));
        let alfa = service.create("  Alfa ", None).await.unwrap();
        assert_eq!(alfa.name, "Alfa");

        assert!(matches!(service.create("Alfa", None).await, Err(AppError::DuplicateName)));
        assert!(matches!(service.create("   ", None).await, Err(AppError::Validation(_))));

        let beta = service.create("Beta", None).await.unwrap();
        assert!(matches!(
            service.update(beta.id, Some(" Alfa  "), ProjectLink::Keep).await,
            Err(AppError::DuplicateName)
        ));
    }

    #[tokio::test]
    async fn team_name_is_unique() {
        let service = TeamService::new(Arc::new(MemoryStore::new()));
        let alfa = service.create("Alfa", None).await.unwrap();
        let beta = service.create("Beta", None).await.unwrap();

        assert!(matches!(service.create("Alfa", None).await, Err(AppError::DuplicateName)));
        assert!(matches!(
            service.update(beta.id, Some("Alfa"), ProjectLink::Keep).await,
            Err(AppError::DuplicateName)
        ));
        // Renomear para o próprio nome não é conflito
        service.update(alfa.id, Some("Alfa"), ProjectLink::Keep).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_project_is_rejected_on_create_and_update() {
        let service = TeamService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            service.create("Alfa", Some(7)).await,
            Err(AppError::NotFound(Resource::Projeto))
        ));

        let team = service.create("Alfa", None).await.unwrap();
        assert!(matches!(
            service.update(team.id, None, ProjectLink::Set(7)).await,
            Err(AppError::NotFound(Resource::Projeto))
        ));
    }

    #[tokio::test]
    async fn update_keeps_clears_or_sets_the_project_link() {
        let store = MemoryStore::new();
        let project_id = seed_project(&store).await;
        let service = TeamService::new(Arc::new(store));

        let team = service.create("Alfa", Some(project_id)).await.unwrap();

        let kept = service.update(team.id, Some("  "), ProjectLink::Keep).await.unwrap();
        assert_eq!(kept.name, "Alfa");
        assert_eq!(kept.project_id, Some(project_id));

        let cleared = service.update(team.id, None, ProjectLink::Clear).await.unwrap();
        assert_eq!(cleared.project_id, None);

        let set = service.update(team.id, Some("Alfa 2"), ProjectLink::Set(project_id)).await.unwrap();
        assert_eq!(set.name, "Alfa 2");
        assert_eq!(set.project_id, Some(project_id));
    }

    #[tokio::test]
    async fn membership_pair_is_unique_and_removal_checks_existence() {
        let store = MemoryStore::new();
        let joao = seed_user(&store, "joao@test.com").await;
        let service = TeamService::new(Arc::new(store));
        let team = service.create("Alfa", None).await.unwrap();

        let first = service.add_member(team.id, joao.id, Some(ScrumRole::Po)).await.unwrap();
        assert_eq!(first.scrum_role, ScrumRole::Po);

        let second = service.add_member(team.id, joao.id, None).await;
        assert!(matches!(second, Err(AppError::AlreadyMember)));

        service.remove_member(team.id, joao.id).await.unwrap();
        assert!(matches!(
            service.remove_member(team.id, joao.id).await,
            Err(AppError::NotFound(Resource::Membro))
        ));
    }

    #[tokio::test]
    async fn adding_a_member_requires_team_and_user() {
        let store = MemoryStore::new();
        let joao = seed_user(&store, "joao@test.com").await;
        let service = TeamService::new(Arc::new(store));
        let team = service.create("Alfa", None).await.unwrap();

        assert!(matches!(
            service.add_member(99, joao.id, None).await,
            Err(AppError::NotFound(Resource::Equipa))
        ));
        assert!(matches!(
            service.add_member(team.id, 99, None).await,
            Err(AppError::NotFound(Resource::Utilizador))
        ));
    }

    #[tokio::test]
    async fn deleting_a_team_deletes_its_memberships() {
        let store = MemoryStore::new();
        let joao = seed_user(&store, "joao@test.com").await;
        let service = TeamService::new(Arc::new(store.clone()));
        let team = service.create("Alfa", None).await.unwrap();
        service.add_member(team.id, joao.id, None).await.unwrap();

        service.delete(team.id).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(!tx.membership_exists(team.id, joao.id).await.unwrap());
        assert!(tx.find_team(team.id).await.unwrap().is_none());
        // O utilizador continua a existir
        assert!(tx.find_user_by_id(joao.id).await.unwrap().is_some());
    }
}
