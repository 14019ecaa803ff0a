use validator::Validate;

use super::access::{require_role, ProjectAction};
use crate::error::AppError;
use crate::models::{
    AddProjectMember, MemberDetail, MemberRole, Pagination, Project, ProjectCreate,
    ProjectResponse, ProjectUpdate,
};
use crate::store::{Store, StoreError};

fn project_not_found() -> AppError {
    AppError::NotFound("Project not found".into())
}

async fn with_details(store: &dyn Store, project: Project) -> Result<ProjectResponse, AppError> {
    let counts = store.project_counts(project.id).await?;
    let members = store.members_with_users(project.id).await?;
    Ok(ProjectResponse {
        project,
        counts,
        members,
    })
}

/// Creates the project with `user_id` as its sole owner.
pub async fn create_project(
    store: &dyn Store,
    user_id: i64,
    input: ProjectCreate,
) -> Result<ProjectResponse, AppError> {
    input.validate()?;
    let project = store.insert_project_with_owner(user_id, &input).await?;
    log::info!("user {} created project {}", user_id, project.id);
    with_details(store, project).await
}

/// Projects the user belongs to, with live counts.
pub async fn list_projects(
    store: &dyn Store,
    user_id: i64,
    page: Pagination,
) -> Result<Vec<ProjectResponse>, AppError> {
    page.validate()?;
    let rows = store
        .projects_for_member(user_id, page.skip, page.limit)
        .await?;
    Ok(rows.into_iter().map(ProjectResponse::from).collect())
}

/// Membership is checked before existence.
pub async fn get_project(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
) -> Result<ProjectResponse, AppError> {
    require_role(store, user_id, project_id, ProjectAction::View).await?;
    let project = store
        .project_by_id(project_id)
        .await?
        .ok_or_else(project_not_found)?;
    with_details(store, project).await
}

pub async fn update_project(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
    patch: ProjectUpdate,
) -> Result<ProjectResponse, AppError> {
    patch.validate()?;
    require_role(store, user_id, project_id, ProjectAction::UpdateProject).await?;
    let project = store
        .update_project(project_id, &patch)
        .await?
        .ok_or_else(project_not_found)?;
    with_details(store, project).await
}

pub async fn delete_project(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
) -> Result<(), AppError> {
    require_role(store, user_id, project_id, ProjectAction::DeleteProject).await?;
    if !store.delete_project(project_id).await? {
        return Err(project_not_found());
    }
    log::info!("user {} deleted project {}", user_id, project_id);
    Ok(())
}

pub async fn add_member(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
    input: AddProjectMember,
) -> Result<MemberDetail, AppError> {
    require_role(store, user_id, project_id, ProjectAction::AddMember).await?;
    if input.role == MemberRole::Owner {
        return Err(AppError::InvalidOperation(
            "A project can only have one owner".into(),
        ));
    }

    let target = store
        .user_by_id(input.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if store.membership(project_id, target.id).await?.is_some() {
        return Err(AppError::Conflict(
            "User is already a member of this project".into(),
        ));
    }

    let member = store
        .insert_member(project_id, target.id, input.role)
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => {
                AppError::Conflict("User is already a member of this project".into())
            }
            other => other.into(),
        })?;
    log::info!(
        "user {} added user {} to project {} as {:?}",
        user_id,
        target.id,
        project_id,
        member.role
    );
    Ok(MemberDetail::new(member, target.email, target.username))
}

pub async fn remove_member(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
    member_id: i64,
) -> Result<(), AppError> {
    require_role(store, user_id, project_id, ProjectAction::RemoveMember).await?;
    let member = store
        .member_in_project(project_id, member_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".into()))?;
    if member.role == MemberRole::Owner {
        return Err(AppError::InvalidOperation(
            "Cannot remove project owner".into(),
        ));
    }
    store.delete_member(member.id).await?;
    log::info!(
        "user {} removed member {} from project {}",
        user_id,
        member_id,
        project_id
    );
    Ok(())
}

pub async fn update_member_role(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
    member_id: i64,
    role: MemberRole,
) -> Result<MemberDetail, AppError> {
    require_role(store, user_id, project_id, ProjectAction::ChangeMemberRole).await?;
    let member = store
        .member_in_project(project_id, member_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".into()))?;
    if member.role == MemberRole::Owner {
        return Err(AppError::InvalidOperation(
            "Cannot change the project owner's role".into(),
        ));
    }
    if role == MemberRole::Owner {
        return Err(AppError::InvalidOperation(
            "A project can only have one owner".into(),
        ));
    }

    let updated = store
        .update_member_role(member.id, role)
        .await?
        .ok_or_else(|| AppError::NotFound("Member not found".into()))?;
    let user = store
        .user_by_id(updated.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(MemberDetail::new(updated, user.email, user.username))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    async fn user(store: &MemoryStore, name: &str) -> i64 {
        store
            .insert_user(NewUser {
                email: format!("{name}@example.com"),
                username: name.into(),
                full_name: None,
                hashed_password: "hash".into(),
            })
            .await
            .unwrap()
            .id
    }

    fn capstone() -> ProjectCreate {
        serde_json::from_value(serde_json::json!({ "name": "Capstone" })).unwrap()
    }

    fn add(user_id: i64, role: MemberRole) -> AddProjectMember {
        AddProjectMember { user_id, role }
    }

    #[actix_rt::test]
    async fn test_capstone_membership_lifecycle() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;

        let project = create_project(&store, alice, capstone()).await.unwrap();
        assert_eq!(project.counts.member_count, 1);
        assert_eq!(project.members.len(), 1);
        assert_eq!(project.members[0].user_id, alice);
        assert_eq!(project.members[0].role, MemberRole::Owner);
        let id = project.project.id;

        let bob_member = add_member(&store, alice, id, add(bob, MemberRole::Member))
            .await
            .unwrap();
        assert_eq!(bob_member.user_name, "bob");
        let fetched = get_project(&store, alice, id).await.unwrap();
        assert_eq!(fetched.counts.member_count, 2);

        remove_member(&store, alice, id, bob_member.id).await.unwrap();

        let owner_id = fetched
            .members
            .iter()
            .find(|m| m.role == MemberRole::Owner)
            .unwrap()
            .id;
        let err = remove_member(&store, alice, id, owner_id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));
        assert_eq!(store.owner_count(id).await, 1);
    }

    #[actix_rt::test]
    async fn test_duplicate_member_is_conflict() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let id = create_project(&store, alice, capstone()).await.unwrap().project.id;

        add_member(&store, alice, id, add(bob, MemberRole::Viewer))
            .await
            .unwrap();
        let err = add_member(&store, alice, id, add(bob, MemberRole::Member))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[actix_rt::test]
    async fn test_add_member_edge_cases() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let id = create_project(&store, alice, capstone()).await.unwrap().project.id;

        let err = add_member(&store, alice, id, add(999, MemberRole::Member))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = add_member(&store, alice, id, add(bob, MemberRole::Owner))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));
    }

    #[actix_rt::test]
    async fn test_role_gates() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let carol = user(&store, "carol").await;
        let id = create_project(&store, alice, capstone()).await.unwrap().project.id;
        let bob_member = add_member(&store, alice, id, add(bob, MemberRole::Member))
            .await
            .unwrap();

        let patch: ProjectUpdate = serde_json::from_str(r#"{"name": "Renamed"}"#).unwrap();
        let err = update_project(&store, bob, id, patch.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = add_member(&store, bob, id, add(carol, MemberRole::Viewer))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        update_member_role(&store, alice, id, bob_member.id, MemberRole::Admin)
            .await
            .unwrap();
        let renamed = update_project(&store, bob, id, patch).await.unwrap();
        assert_eq!(renamed.project.name, "Renamed");
        assert_eq!(renamed.members.len(), 2);
        assert_eq!(renamed.counts.member_count, 2);

        let err = delete_project(&store, bob, id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        delete_project(&store, alice, id).await.unwrap();
    }

    #[actix_rt::test]
    async fn test_owner_role_is_fixed() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let project = create_project(&store, alice, capstone()).await.unwrap();
        let id = project.project.id;
        let owner_member = project.members[0].id;
        let bob_member = add_member(&store, alice, id, add(bob, MemberRole::Admin))
            .await
            .unwrap();

        let err = update_member_role(&store, bob, id, owner_member, MemberRole::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));

        let err = update_member_role(&store, alice, id, bob_member.id, MemberRole::Owner)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation(_)));

        let err = update_member_role(&store, alice, id, 999, MemberRole::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[actix_rt::test]
    async fn test_get_project_forbidden_before_not_found() {
        let store = MemoryStore::new();
        let carol = user(&store, "carol").await;
        let err = get_project(&store, carol, 12345).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[actix_rt::test]
    async fn test_list_only_member_projects() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        create_project(&store, alice, capstone()).await.unwrap();

        let alice_projects = list_projects(&store, alice, Pagination::default())
            .await
            .unwrap();
        assert_eq!(alice_projects.len(), 1);
        let bob_projects = list_projects(&store, bob, Pagination::default())
            .await
            .unwrap();
        assert!(bob_projects.is_empty());

        let err = list_projects(&store, alice, Pagination { skip: 0, limit: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
