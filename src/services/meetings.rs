use validator::Validate;

use super::access::{require_role, ProjectAction};
use crate::error::AppError;
use crate::models::{Meeting, MeetingCreate, MeetingQuery};
use crate::store::Store;

/// Most recent meetings first.
pub async fn list_meetings(
    store: &dyn Store,
    user_id: i64,
    query: MeetingQuery,
) -> Result<Vec<Meeting>, AppError> {
    query.validate()?;
    require_role(store, user_id, query.project_id, ProjectAction::ListMeetings).await?;
    let meetings = store
        .meetings_for_project(query.project_id, query.skip, query.limit)
        .await?;
    Ok(meetings)
}

pub async fn create_meeting(
    store: &dyn Store,
    user_id: i64,
    input: MeetingCreate,
) -> Result<Meeting, AppError> {
    input.validate()?;
    require_role(store, user_id, input.project_id, ProjectAction::CreateMeeting).await?;
    let meeting = store.insert_meeting(user_id, &input).await?;
    log::info!(
        "user {} scheduled meeting {} in project {}",
        user_id,
        meeting.id,
        meeting.project_id
    );
    Ok(meeting)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, ProjectCreate};
    use crate::services::projects;
    use crate::store::MemoryStore;

    #[actix_rt::test]
    async fn test_meetings_are_membership_gated_and_ordered() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for name in ["alice", "carol"] {
            let user = store
                .insert_user(NewUser {
                    email: format!("{name}@example.com"),
                    username: name.into(),
                    full_name: None,
                    hashed_password: "hash".into(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let (alice, carol) = (ids[0], ids[1]);
        let input: ProjectCreate =
            serde_json::from_value(serde_json::json!({ "name": "Capstone" })).unwrap();
        let project_id = projects::create_project(&store, alice, input)
            .await
            .unwrap()
            .project
            .id;

        for (title, date) in [
            ("Kickoff", "2024-09-02T15:00:00Z"),
            ("Review", "2024-09-16T15:00:00Z"),
        ] {
            let meeting: MeetingCreate = serde_json::from_value(serde_json::json!({
                "title": title,
                "project_id": project_id,
                "meeting_date": date,
                "creator_id": carol
            }))
            .unwrap();
            let created = create_meeting(&store, alice, meeting).await.unwrap();
            assert_eq!(created.creator_id, alice);
        }

        let query = MeetingQuery {
            project_id,
            skip: 0,
            limit: 100,
        };
        let listed = list_meetings(&store, alice, query.clone()).await.unwrap();
        let titles: Vec<_> = listed.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Review", "Kickoff"]);

        let err = list_meetings(&store, carol, query).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
