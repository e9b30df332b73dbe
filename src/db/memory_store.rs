// src/db/memory_store.rs
//
// Store em memória com as mesmas restrições de unicidade do schema Postgres.
// Uma transação de cada vez: `begin` fica com o lock e trabalha numa cópia das
// tabelas; `commit` troca a cópia pelo original; largar a transação descarta a cópia.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::{
    common::{
        db_utils::{add_points_checked, duplicate_course_code, duplicate_discipline_code},
        error::{AppError, Resource},
    },
    db::{GamificationRepository, HierarchyRepository, Store, TeamRepository, Transaction, UserRepository},
    models::{
        auth::{NewPrincipal, Principal, Profile, Role},
        gamification::{Achievement, AchievementDetails, Prize, PrizeFields},
        hierarchy::{Course, Discipline, Project, ProjectFields, Sprint, SprintFields},
        team::{MemberDetails, Membership, RosterEntry, ScrumRole, Team},
    },
};

/// Operações onde os testes podem provocar uma falha do Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    AddPoints,
    InsertAchievement,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i64,
    users: Vec<Principal>,
    courses: Vec<Course>,
    // (id, professor_id, course_id)
    professor_courses: Vec<(i64, i64, i64)>,
    disciplines: Vec<Discipline>,
    projects: Vec<Project>,
    sprints: Vec<Sprint>,
    teams: Vec<Team>,
    memberships: Vec<Membership>,
    prizes: Vec<Prize>,
    achievements: Vec<Achievement>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<AsyncMutex<Tables>>,
    faults: Arc<Mutex<HashSet<Fault>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A próxima chamada à operação `fault` falha (uma só vez).
    #[cfg(test)]
    pub fn inject_fault(&self, fault: Fault) {
        self.faults.lock().expect("faults lock").insert(fault);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, AppError> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTransaction {
            guard,
            work,
            faults: self.faults.clone(),
        }))
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    faults: Arc<Mutex<HashSet<Fault>>>,
}

impl MemoryTransaction {
    fn check(&self, fault: Fault) -> Result<(), AppError> {
        let triggered = self
            .faults
            .lock()
            .map(|mut set| set.remove(&fault))
            .unwrap_or(false);

        if triggered {
            return Err(AppError::DatabaseError(sqlx::Error::Protocol(format!(
                "falha simulada em {:?}",
                fault
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.check(Fault::Commit)?;
        let MemoryTransaction { mut guard, work, .. } = *self;
        *guard = work;
        Ok(())
    }
}

fn retain_count<T>(rows: &mut Vec<T>, keep: impl Fn(&T) -> bool) -> u64 {
    let before = rows.len();
    rows.retain(keep);
    (before - rows.len()) as u64
}

#[async_trait]
impl UserRepository for MemoryTransaction {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<Principal>, AppError> {
        Ok(self.work.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&mut self, id: i64) -> Result<Option<Principal>, AppError> {
        Ok(self.work.users.iter().find(|u| u.id == id).cloned())
    }

    async fn list_users(&mut self) -> Result<Vec<Principal>, AppError> {
        Ok(self.work.users.clone())
    }

    async fn insert_user(&mut self, new_user: &NewPrincipal) -> Result<Principal, AppError> {
        if self.work.users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::DuplicateEmail);
        }

        let profile = match new_user.role {
            Role::Admin => Profile::Admin,
            Role::Professor => Profile::Professor { department: new_user.department.clone() },
            Role::Aluno => Profile::Student { total_points: 0 },
        };

        let principal = Principal {
            id: self.work.next_id(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            role: new_user.role,
            created_at: Utc::now(),
            profile,
        };
        self.work.users.push(principal.clone());
        Ok(principal)
    }

    async fn add_points(&mut self, student_id: i64, delta: i32) -> Result<i32, AppError> {
        self.check(Fault::AddPoints)?;

        let user = self.work.users.iter_mut().find(|u| u.id == student_id);
        match user.map(|u| &mut u.profile) {
            Some(Profile::Student { total_points }) => {
                *total_points = add_points_checked(*total_points, delta)?;
                Ok(*total_points)
            }
            _ => Err(AppError::NotFound(Resource::Aluno)),
        }
    }

    async fn delete_user(&mut self, id: i64) -> Result<bool, AppError> {
        Ok(retain_count(&mut self.work.users, |u| u.id != id) > 0)
    }
}

#[async_trait]
impl HierarchyRepository for MemoryTransaction {
    async fn course_code_exists(&mut self, code: &str) -> Result<bool, AppError> {
        Ok(self.work.courses.iter().any(|c| c.code == code))
    }

    async fn insert_course(&mut self, name: &str, code: &str, admin_id: Option<i64>) -> Result<Course, AppError> {
        if self.work.courses.iter().any(|c| c.code == code) {
            return Err(duplicate_course_code(code));
        }
        let course = Course {
            id: self.work.next_id(),
            name: name.to_string(),
            code: code.to_string(),
            admin_id,
        };
        self.work.courses.push(course.clone());
        Ok(course)
    }

    async fn find_course(&mut self, id: i64) -> Result<Option<Course>, AppError> {
        Ok(self.work.courses.iter().find(|c| c.id == id).cloned())
    }

    async fn list_courses(&mut self) -> Result<Vec<Course>, AppError> {
        Ok(self.work.courses.clone())
    }

    async fn update_course(&mut self, course: &Course) -> Result<Course, AppError> {
        if self.work.courses.iter().any(|c| c.code == course.code && c.id != course.id) {
            return Err(duplicate_course_code(&course.code));
        }
        let slot = self
            .work
            .courses
            .iter_mut()
            .find(|c| c.id == course.id)
            .ok_or(AppError::NotFound(Resource::Curso))?;
        *slot = course.clone();
        Ok(course.clone())
    }

    async fn delete_course(&mut self, id: i64) -> Result<bool, AppError> {
        Ok(retain_count(&mut self.work.courses, |c| c.id != id) > 0)
    }

    async fn clear_course_admin(&mut self, admin_id: i64) -> Result<u64, AppError> {
        let mut cleared = 0;
        for course in self.work.courses.iter_mut().filter(|c| c.admin_id == Some(admin_id)) {
            course.admin_id = None;
            cleared += 1;
        }
        Ok(cleared)
    }

    async fn professor_has_course(&mut self, professor_id: i64) -> Result<bool, AppError> {
        Ok(self.work.professor_courses.iter().any(|(_, p, _)| *p == professor_id))
    }

    async fn insert_professor_course(&mut self, professor_id: i64, course_id: i64) -> Result<(), AppError> {
        if self.work.professor_courses.iter().any(|(_, p, _)| *p == professor_id) {
            return Err(AppError::ProfessorAlreadyAssigned);
        }
        let id = self.work.next_id();
        self.work.professor_courses.push((id, professor_id, course_id));
        Ok(())
    }

    async fn list_professor_courses(&mut self, professor_id: i64) -> Result<Vec<Course>, AppError> {
        let courses = self
            .work
            .professor_courses
            .iter()
            .filter(|(_, p, _)| *p == professor_id)
            .filter_map(|(_, _, c)| self.work.courses.iter().find(|course| course.id == *c).cloned())
            .collect();
        Ok(courses)
    }

    async fn delete_professor_course(&mut self, professor_id: i64, course_id: i64) -> Result<bool, AppError> {
        let removed = retain_count(&mut self.work.professor_courses, |(_, p, c)| {
            !(*p == professor_id && *c == course_id)
        });
        Ok(removed > 0)
    }

    async fn delete_professor_courses_of_course(&mut self, course_id: i64) -> Result<u64, AppError> {
        Ok(retain_count(&mut self.work.professor_courses, |(_, _, c)| *c != course_id))
    }

    async fn delete_professor_courses_of_professor(&mut self, professor_id: i64) -> Result<u64, AppError> {
        Ok(retain_count(&mut self.work.professor_courses, |(_, p, _)| *p != professor_id))
    }

    async fn discipline_code_exists(&mut self, code: &str) -> Result<bool, AppError> {
        Ok(self.work.disciplines.iter().any(|d| d.code == code))
    }

    async fn insert_discipline(&mut self, course_id: i64, name: &str, code: &str) -> Result<Discipline, AppError> {
        if self.work.disciplines.iter().any(|d| d.code == code) {
            return Err(duplicate_discipline_code(code));
        }
        let discipline = Discipline {
            id: self.work.next_id(),
            name: name.to_string(),
            code: code.to_string(),
            course_id,
        };
        self.work.disciplines.push(discipline.clone());
        Ok(discipline)
    }

    async fn find_discipline(&mut self, id: i64) -> Result<Option<Discipline>, AppError> {
        Ok(self.work.disciplines.iter().find(|d| d.id == id).cloned())
    }

    async fn list_disciplines(&mut self, course_id: i64) -> Result<Vec<Discipline>, AppError> {
        Ok(self.work.disciplines.iter().filter(|d| d.course_id == course_id).cloned().collect())
    }

    async fn update_discipline(&mut self, discipline: &Discipline) -> Result<Discipline, AppError> {
        if self
            .work
            .disciplines
            .iter()
            .any(|d| d.code == discipline.code && d.id != discipline.id)
        {
            return Err(duplicate_discipline_code(&discipline.code));
        }
        let slot = self
            .work
            .disciplines
            .iter_mut()
            .find(|d| d.id == discipline.id)
            .ok_or(AppError::NotFound(Resource::Disciplina))?;
        *slot = discipline.clone();
        Ok(discipline.clone())
    }

    async fn delete_discipline(&mut self, id: i64) -> Result<bool, AppError> {
        Ok(retain_count(&mut self.work.disciplines, |d| d.id != id) > 0)
    }

    async fn insert_project(&mut self, course_id: i64, fields: &ProjectFields) -> Result<Project, AppError> {
        let project = Project {
            id: self.work.next_id(),
            name: fields.name.clone(),
            description: fields.description.clone(),
            start_date: fields.start_date,
            end_date: fields.end_date,
            course_id,
        };
        self.work.projects.push(project.clone());
        Ok(project)
    }

    async fn find_project(&mut self, id: i64) -> Result<Option<Project>, AppError> {
        Ok(self.work.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects(&mut self, course_id: i64) -> Result<Vec<Project>, AppError> {
        Ok(self.work.projects.iter().filter(|p| p.course_id == course_id).cloned().collect())
    }

    async fn update_project(&mut self, id: i64, fields: &ProjectFields) -> Result<Project, AppError> {
        let project = self
            .work
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::NotFound(Resource::Projeto))?;
        project.name = fields.name.clone();
        project.description = fields.description.clone();
        project.start_date = fields.start_date;
        project.end_date = fields.end_date;
        Ok(project.clone())
    }

    async fn delete_project(&mut self, id: i64) -> Result<bool, AppError> {
        Ok(retain_count(&mut self.work.projects, |p| p.id != id) > 0)
    }

    async fn insert_sprint(&mut self, project_id: i64, fields: &SprintFields) -> Result<Sprint, AppError> {
        let sprint = Sprint {
            id: self.work.next_id(),
            name: fields.name.clone(),
            objectives: fields.objectives.clone(),
            start_date: fields.start_date,
            end_date: fields.end_date,
            project_id,
        };
        self.work.sprints.push(sprint.clone());
        Ok(sprint)
    }

    async fn list_sprints(&mut self, project_id: i64) -> Result<Vec<Sprint>, AppError> {
        Ok(self.work.sprints.iter().filter(|s| s.project_id == project_id).cloned().collect())
    }

    async fn delete_sprint(&mut self, id: i64) -> Result<bool, AppError> {
        Ok(retain_count(&mut self.work.sprints, |s| s.id != id) > 0)
    }

    async fn delete_sprints_of_project(&mut self, project_id: i64) -> Result<u64, AppError> {
        Ok(retain_count(&mut self.work.sprints, |s| s.project_id != project_id))
    }
}

#[async_trait]
impl TeamRepository for MemoryTransaction {
    async fn team_name_exists(&mut self, name: &str) -> Result<bool, AppError> {
        Ok(self.work.teams.iter().any(|t| t.name == name))
    }

    async fn insert_team(&mut self, name: &str, project_id: Option<i64>) -> Result<Team, AppError> {
        if self.work.teams.iter().any(|t| t.name == name) {
            return Err(AppError::DuplicateName);
        }
        let team = Team {
            id: self.work.next_id(),
            name: name.to_string(),
            project_id,
        };
        self.work.teams.push(team.clone());
        Ok(team)
    }

    async fn find_team(&mut self, id: i64) -> Result<Option<Team>, AppError> {
        Ok(self.work.teams.iter().find(|t| t.id == id).cloned())
    }

    async fn list_teams(&mut self) -> Result<Vec<Team>, AppError> {
        Ok(self.work.teams.clone())
    }

    async fn update_team(&mut self, team: &Team) -> Result<Team, AppError> {
        if self.work.teams.iter().any(|t| t.name == team.name && t.id != team.id) {
            return Err(AppError::DuplicateName);
        }
        let slot = self
            .work
            .teams
            .iter_mut()
            .find(|t| t.id == team.id)
            .ok_or(AppError::NotFound(Resource::Equipa))?;
        *slot = team.clone();
        Ok(team.clone())
    }

    async fn delete_team(&mut self, id: i64) -> Result<bool, AppError> {
        Ok(retain_count(&mut self.work.teams, |t| t.id != id) > 0)
    }

    async fn unlink_project_teams(&mut self, project_id: i64) -> Result<u64, AppError> {
        let mut unlinked = 0;
        for team in self.work.teams.iter_mut().filter(|t| t.project_id == Some(project_id)) {
            team.project_id = None;
            unlinked += 1;
        }
        Ok(unlinked)
    }

    async fn membership_exists(&mut self, team_id: i64, user_id: i64) -> Result<bool, AppError> {
        Ok(self
            .work
            .memberships
            .iter()
            .any(|m| m.team_id == team_id && m.user_id == user_id))
    }

    async fn insert_membership(
        &mut self,
        team_id: i64,
        user_id: i64,
        scrum_role: ScrumRole,
        joined_at: DateTime<Utc>,
    ) -> Result<Membership, AppError> {
        if self.membership_exists(team_id, user_id).await? {
            return Err(AppError::AlreadyMember);
        }
        let membership = Membership {
            id: self.work.next_id(),
            team_id,
            user_id,
            scrum_role,
            joined_at,
        };
        self.work.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn list_members(&mut self, team_id: i64) -> Result<Vec<MemberDetails>, AppError> {
        let members = self
            .work
            .memberships
            .iter()
            .filter(|m| m.team_id == team_id)
            .filter_map(|m| {
                let user = self.work.users.iter().find(|u| u.id == m.user_id)?;
                Some(MemberDetails {
                    id: m.id,
                    user_id: m.user_id,
                    user_name: user.name.clone(),
                    user_email: user.email.clone(),
                    scrum_role: m.scrum_role,
                    joined_at: m.joined_at,
                })
            })
            .collect();
        Ok(members)
    }

    async fn delete_membership(&mut self, team_id: i64, user_id: i64) -> Result<bool, AppError> {
        let removed = retain_count(&mut self.work.memberships, |m| {
            !(m.team_id == team_id && m.user_id == user_id)
        });
        Ok(removed > 0)
    }

    async fn delete_memberships_of_team(&mut self, team_id: i64) -> Result<u64, AppError> {
        Ok(retain_count(&mut self.work.memberships, |m| m.team_id != team_id))
    }

    async fn delete_memberships_of_user(&mut self, user_id: i64) -> Result<u64, AppError> {
        Ok(retain_count(&mut self.work.memberships, |m| m.user_id != user_id))
    }

    async fn course_roster(&mut self, course_id: i64) -> Result<Vec<RosterEntry>, AppError> {
        let mut roster = Vec::new();
        for project in self.work.projects.iter().filter(|p| p.course_id == course_id) {
            for team in self.work.teams.iter().filter(|t| t.project_id == Some(project.id)) {
                for member in self.work.memberships.iter().filter(|m| m.team_id == team.id) {
                    let Some(user) = self.work.users.iter().find(|u| u.id == member.user_id) else {
                        continue;
                    };
                    roster.push(RosterEntry {
                        user_id: user.id,
                        user_name: user.name.clone(),
                        user_email: user.email.clone(),
                        team_name: team.name.clone(),
                        project_name: project.name.clone(),
                        total_points: user.total_points(),
                    });
                }
            }
        }
        Ok(roster)
    }
}

#[async_trait]
impl GamificationRepository for MemoryTransaction {
    async fn insert_prize(&mut self, discipline_id: i64, fields: &PrizeFields) -> Result<Prize, AppError> {
        let prize = Prize {
            id: self.work.next_id(),
            discipline_id,
            name: fields.name.clone(),
            description: fields.description.clone(),
            points: fields.points,
            kind: fields.kind,
        };
        self.work.prizes.push(prize.clone());
        Ok(prize)
    }

    async fn find_prize(&mut self, id: i64) -> Result<Option<Prize>, AppError> {
        Ok(self.work.prizes.iter().find(|p| p.id == id).cloned())
    }

    async fn list_prizes(&mut self, discipline_id: i64) -> Result<Vec<Prize>, AppError> {
        Ok(self
            .work
            .prizes
            .iter()
            .filter(|p| p.discipline_id == discipline_id)
            .cloned()
            .collect())
    }

    async fn delete_prize(&mut self, id: i64) -> Result<bool, AppError> {
        Ok(retain_count(&mut self.work.prizes, |p| p.id != id) > 0)
    }

    async fn insert_achievement(
        &mut self,
        prize_id: i64,
        student_id: i64,
        awarded_at: DateTime<Utc>,
    ) -> Result<Achievement, AppError> {
        self.check(Fault::InsertAchievement)?;
        let achievement = Achievement {
            id: self.work.next_id(),
            prize_id,
            student_id,
            awarded_at,
        };
        self.work.achievements.push(achievement.clone());
        Ok(achievement)
    }

    async fn list_student_achievements(&mut self, student_id: i64) -> Result<Vec<AchievementDetails>, AppError> {
        let achievements = self
            .work
            .achievements
            .iter()
            .filter(|a| a.student_id == student_id)
            .filter_map(|a| {
                let prize = self.work.prizes.iter().find(|p| p.id == a.prize_id)?;
                Some(AchievementDetails {
                    id: a.id,
                    prize_id: prize.id,
                    prize_name: prize.name.clone(),
                    points: prize.points,
                    kind: prize.kind,
                    awarded_at: a.awarded_at,
                })
            })
            .collect();
        Ok(achievements)
    }

    async fn take_achievements_of_prize(&mut self, prize_id: i64) -> Result<Vec<i64>, AppError> {
        let (taken, kept): (Vec<Achievement>, Vec<Achievement>) = std::mem::take(&mut self.work.achievements)
            .into_iter()
            .partition(|a| a.prize_id == prize_id);
        self.work.achievements = kept;
        Ok(taken.into_iter().map(|a| a.student_id).collect())
    }

    async fn delete_achievements_of_student(&mut self, student_id: i64) -> Result<u64, AppError> {
        Ok(retain_count(&mut self.work.achievements, |a| a.student_id != student_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_user(tx: &mut Box<dyn Transaction>, email: &str) -> Principal {
        tx.insert_user(&NewPrincipal {
            name: email.into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::Aluno,
            department: None,
        })
        .await
        .unwrap()
    }

    // Sem passar pelos serviços: as inserções repetidas falham no próprio store
    #[tokio::test]
    async fn inserts_that_skip_the_service_checks_still_hit_the_unique_guards() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        tx.insert_course("Informática", "LEI", None).await.unwrap();
        assert!(matches!(
            tx.insert_course("Outro", "LEI", None).await,
            Err(AppError::DuplicateCode(_))
        ));

        let team = tx.insert_team("Alfa", None).await.unwrap();
        assert!(matches!(tx.insert_team("Alfa", None).await, Err(AppError::DuplicateName)));

        let user = seed_user(&mut tx, "joao@test.com").await;
        assert!(matches!(
            tx.insert_user(&NewPrincipal {
                name: "Outro".into(),
                email: "joao@test.com".into(),
                password_hash: "hash".into(),
                role: Role::Professor,
                department: None,
            })
            .await,
            Err(AppError::DuplicateEmail)
        ));

        tx.insert_membership(team.id, user.id, ScrumRole::Dev, Utc::now()).await.unwrap();
        assert!(matches!(
            tx.insert_membership(team.id, user.id, ScrumRole::Po, Utc::now()).await,
            Err(AppError::AlreadyMember)
        ));
    }

    #[tokio::test]
    async fn point_total_cannot_overflow() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let user = seed_user(&mut tx, "joao@test.com").await;

        assert_eq!(tx.add_points(user.id, i32::MAX).await.unwrap(), i32::MAX);
        assert!(matches!(tx.add_points(user.id, 1).await, Err(AppError::PointsOutOfRange)));
        assert_eq!(
            tx.find_user_by_id(user.id).await.unwrap().unwrap().total_points(),
            Some(i32::MAX)
        );
    }
}
