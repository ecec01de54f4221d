use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Token the default app accepts.
pub const TEST_TOKEN: &str = "test-token";

/// User id of the caller the token belongs to.
pub const ME: &str = "1";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub user_id: String,
    pub nickname: String,
    pub muted: bool,
    pub image_url: Option<String>,
    pub autokicked: bool,
    pub app_installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub image_url: Option<String>,
    pub creator_user_id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub members: Vec<Member>,
    pub share_url: Option<String>,
    #[serde(skip)]
    pub share_token: Option<String>,
    pub office_mode: bool,
    pub messages: Value,
}

#[derive(Deserialize)]
pub struct GroupParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub share: Option<bool>,
    pub office_mode: Option<bool>,
}

#[derive(Deserialize)]
pub struct NewMember {
    pub nickname: String,
    pub user_id: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub guid: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMembers {
    pub members: Vec<NewMember>,
}

#[derive(Deserialize)]
pub struct ChangeOwner {
    pub group_id: String,
    pub owner_id: String,
}

#[derive(Deserialize)]
pub struct MembershipUpdate {
    pub membership: Nickname,
}

#[derive(Deserialize)]
pub struct Nickname {
    pub nickname: String,
}

#[derive(Deserialize)]
pub struct Params {
    pub token: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub group_id: Option<String>,
}

/// Knobs for the simulated service.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub token: String,
    /// How many polls of a member-add job answer 503 before it resolves.
    pub polls_until_ready: u32,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            token: TEST_TOKEN.to_string(),
            polls_until_ready: 1,
        }
    }
}

struct Job {
    group_id: String,
    members: Vec<NewMember>,
    polls_left: u32,
}

#[derive(Default)]
struct Store {
    groups: Vec<Group>,
    former: Vec<Group>,
    jobs: HashMap<String, Job>,
    next_id: u64,
}

impl Store {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn group_mut(&mut self, id: &str) -> Result<&mut Group, Failure> {
        self.groups.iter_mut().find(|g| g.id == id).ok_or(Failure(StatusCode::NOT_FOUND))
    }
}

#[derive(Clone)]
struct AppState {
    db: Arc<RwLock<Store>>,
    config: Arc<MockConfig>,
}

/// An error status with the service's `meta` envelope.
struct Failure(StatusCode);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = json!({
            "meta": {"code": self.0.as_u16(), "errors": [self.0.canonical_reason().unwrap_or("error")]},
            "response": null,
        });
        (self.0, Json(body)).into_response()
    }
}

fn envelope<T: Serialize>(value: T) -> Json<Value> {
    Json(json!({"response": value, "meta": {"code": 200}}))
}

fn member(id: String, user_id: &str, nickname: &str) -> Member {
    Member {
        id,
        user_id: user_id.to_string(),
        nickname: nickname.to_string(),
        muted: false,
        image_url: None,
        autokicked: false,
        app_installed: true,
        guid: None,
    }
}

fn group(id: &str, name: &str, members: Vec<Member>) -> Group {
    Group {
        id: id.to_string(),
        name: name.to_string(),
        kind: "private".to_string(),
        description: String::new(),
        image_url: None,
        creator_user_id: ME.to_string(),
        created_at: 1302623328,
        updated_at: 1302623328,
        members,
        share_url: None,
        share_token: None,
        office_mode: false,
        messages: json!({
            "count": 1,
            "last_message_id": "1",
            "last_message_created_at": 1302623328,
            "preview": {"nickname": "Me", "text": "hi", "image_url": null, "attachments": []},
        }),
    }
}

/// Seed data: group `32968213` "Test Group" with the caller and one other
/// member, and a former group `55555` the caller can rejoin.
fn seed() -> Store {
    let mut store = Store {
        next_id: 1000,
        ..Store::default()
    };
    let mut test_group = group(
        "32968213",
        "Test Group",
        vec![member("100".into(), ME, "Me"), member("101".into(), "2", "Friend")],
    );
    test_group.share_token = Some("SHARE".to_string());
    test_group.share_url = Some("https://groupme.com/join_group/32968213/SHARE".to_string());
    store.groups.push(test_group);
    store.former.push(group("55555", "Old Friends", vec![member("200".into(), ME, "Me")]));
    store
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(seed())),
        config: Arc::new(config),
    };
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/former", get(list_former))
        .route("/groups/join/", post(rejoin_group))
        .route("/groups/change_owners", post(change_owners))
        .route("/groups/{id}", get(get_group))
        .route("/groups/{id}/update", post(update_group))
        .route("/groups/{id}/destroy", post(destroy_group))
        .route("/groups/{id}/join/{share_token}", post(join_group))
        .route("/groups/{id}/members/add", post(add_members))
        .route("/groups/{id}/members/{membership_id}/remove", post(remove_member))
        .route("/groups/{id}/memberships/update", post(update_membership))
        .route("/groups/{id}/{results_id}", get(member_results))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

async fn require_token(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    request: Request,
    next: Next,
) -> Response {
    if params.token.as_deref() != Some(state.config.token.as_str()) {
        return Failure(StatusCode::UNAUTHORIZED).into_response();
    }
    next.run(request).await
}

async fn list_groups(State(state): State<AppState>, Query(params): Query<Params>) -> Json<Value> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(10);
    let db = state.db.read().await;
    let groups: Vec<&Group> = db.groups.iter().skip((page - 1) * per_page).take(per_page).collect();
    envelope(groups)
}

async fn list_former(State(state): State<AppState>) -> Json<Value> {
    envelope(&state.db.read().await.former)
}

async fn get_group(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, Failure> {
    let mut db = state.db.write().await;
    Ok(envelope(&*db.group_mut(&id)?))
}

async fn create_group(
    State(state): State<AppState>,
    Json(params): Json<GroupParams>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let name = params.name.ok_or(Failure(StatusCode::BAD_REQUEST))?;
    let mut db = state.db.write().await;
    let id = db.next_id();
    let membership_id = db.next_id();
    let mut created = group(&id, &name, vec![member(membership_id, ME, "Me")]);
    created.description = params.description.unwrap_or_default();
    created.image_url = params.image_url.filter(|url| !url.is_empty());
    created.office_mode = params.office_mode.unwrap_or(false);
    if params.share.unwrap_or(false) {
        let token = Uuid::new_v4().simple().to_string();
        created.share_url = Some(format!("https://groupme.com/join_group/{id}/{token}"));
        created.share_token = Some(token);
    }
    db.groups.push(created.clone());
    Ok((StatusCode::CREATED, envelope(created)))
}

async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(params): Json<GroupParams>,
) -> Result<Json<Value>, Failure> {
    let mut db = state.db.write().await;
    let group = db.group_mut(&id)?;
    if let Some(name) = params.name {
        group.name = name;
    }
    if let Some(description) = params.description {
        group.description = description;
    }
    if let Some(image_url) = params.image_url {
        group.image_url = Some(image_url).filter(|url| !url.is_empty());
    }
    if let Some(office_mode) = params.office_mode {
        group.office_mode = office_mode;
    }
    match params.share {
        Some(true) if group.share_token.is_none() => {
            let token = Uuid::new_v4().simple().to_string();
            group.share_url = Some(format!("https://groupme.com/join_group/{id}/{token}"));
            group.share_token = Some(token);
        }
        Some(false) => {
            group.share_url = None;
            group.share_token = None;
        }
        _ => {}
    }
    group.updated_at += 1;
    Ok(envelope(&*group))
}

async fn destroy_group(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, Failure> {
    let mut db = state.db.write().await;
    let index = db
        .groups
        .iter()
        .position(|g| g.id == id)
        .ok_or(Failure(StatusCode::NOT_FOUND))?;
    if db.groups[index].creator_user_id != ME {
        return Err(Failure(StatusCode::FORBIDDEN));
    }
    db.groups.remove(index);
    Ok(envelope(Value::Null))
}

async fn join_group(
    State(state): State<AppState>,
    Path((id, share_token)): Path<(String, String)>,
) -> Result<Json<Value>, Failure> {
    let mut db = state.db.write().await;
    let group = db.group_mut(&id)?;
    if group.share_token.as_deref() != Some(share_token.as_str()) {
        return Err(Failure(StatusCode::NOT_FOUND));
    }
    Ok(envelope(&*group))
}

async fn rejoin_group(State(state): State<AppState>, Query(params): Query<Params>) -> Result<Json<Value>, Failure> {
    let id = params.group_id.ok_or(Failure(StatusCode::BAD_REQUEST))?;
    let mut db = state.db.write().await;
    let index = db
        .former
        .iter()
        .position(|g| g.id == id)
        .ok_or(Failure(StatusCode::NOT_FOUND))?;
    let group = db.former.remove(index);
    db.groups.push(group.clone());
    Ok(envelope(group))
}

async fn change_owners(State(state): State<AppState>, Json(requests): Json<Vec<ChangeOwner>>) -> Json<Value> {
    let mut db = state.db.write().await;
    let results: Vec<Value> = requests
        .into_iter()
        .map(|request| {
            let status = match db.group_mut(&request.group_id) {
                Err(_) => "404",
                Ok(group) if group.creator_user_id != ME => "403",
                Ok(group) if group.creator_user_id == request.owner_id => "400",
                Ok(group) if !group.members.iter().any(|m| m.user_id == request.owner_id) => "404",
                Ok(group) => {
                    group.creator_user_id = request.owner_id.clone();
                    "200"
                }
            };
            json!({"group_id": request.group_id, "owner_id": request.owner_id, "status": status})
        })
        .collect();
    envelope(json!({ "results": results }))
}

async fn add_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AddMembers>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    if body.members.iter().any(|m| m.guid.is_none()) {
        return Err(Failure(StatusCode::BAD_REQUEST));
    }
    let mut db = state.db.write().await;
    db.group_mut(&id)?;
    let results_id = Uuid::new_v4().to_string();
    db.jobs.insert(
        results_id.clone(),
        Job {
            group_id: id,
            members: body.members,
            polls_left: state.config.polls_until_ready,
        },
    );
    debug!("queued member-add job {results_id}");
    Ok((StatusCode::ACCEPTED, envelope(json!({ "results_id": results_id }))))
}

/// Answers 503 while the job is pending, then the added members once.
/// Later polls answer 404: the results have expired.
async fn member_results(
    State(state): State<AppState>,
    Path((id, results_id)): Path<(String, String)>,
) -> Result<Json<Value>, Failure> {
    let mut db = state.db.write().await;
    let job = match db.jobs.get_mut(&results_id) {
        Some(job) if job.group_id == id => job,
        _ => return Err(Failure(StatusCode::NOT_FOUND)),
    };
    if job.polls_left > 0 {
        job.polls_left -= 1;
        return Err(Failure(StatusCode::SERVICE_UNAVAILABLE));
    }
    let Some(job) = db.jobs.remove(&results_id) else {
        return Err(Failure(StatusCode::NOT_FOUND));
    };
    let mut added = Vec::with_capacity(job.members.len());
    for new in job.members {
        let membership_id = db.next_id();
        let user_id = new
            .user_id
            .or(new.phone_number)
            .or(new.email)
            .unwrap_or_else(|| membership_id.clone());
        let mut m = member(membership_id, &user_id, &new.nickname);
        m.guid = new.guid;
        added.push(m);
    }
    db.group_mut(&job.group_id)?.members.extend(added.iter().cloned());
    debug!("resolved member-add job {results_id} with {} members", added.len());
    Ok(envelope(json!({ "members": added })))
}

async fn remove_member(
    State(state): State<AppState>,
    Path((id, membership_id)): Path<(String, String)>,
) -> Result<Json<Value>, Failure> {
    let mut db = state.db.write().await;
    let group = db.group_mut(&id)?;
    let index = group
        .members
        .iter()
        .position(|m| m.id == membership_id)
        .ok_or(Failure(StatusCode::NOT_FOUND))?;
    group.members.remove(index);
    Ok(envelope(Value::Null))
}

async fn update_membership(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<MembershipUpdate>,
) -> Result<Json<Value>, Failure> {
    let mut db = state.db.write().await;
    let group = db.group_mut(&id)?;
    let me = group
        .members
        .iter_mut()
        .find(|m| m.user_id == ME)
        .ok_or(Failure(StatusCode::NOT_FOUND))?;
    me.nickname = update.membership.nickname;
    Ok(envelope(&*me))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_serializes_type_and_hides_share_token() {
        let mut g = group("1", "G", Vec::new());
        g.share_token = Some("secret".to_string());
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["type"], "private");
        assert!(json.get("share_token").is_none());
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn seed_has_test_group() {
        let store = seed();
        assert_eq!(store.groups[0].id, "32968213");
        assert_eq!(store.groups[0].name, "Test Group");
        assert_eq!(store.former.len(), 1);
    }

    #[test]
    fn envelope_wraps_payload() {
        let Json(value) = envelope(vec![1, 2]);
        assert_eq!(value["response"], json!([1, 2]));
    }

    #[test]
    fn member_guid_omitted_when_absent() {
        let json = serde_json::to_value(member("1".into(), "2", "n")).unwrap();
        assert!(json.get("guid").is_none());
        assert_eq!(json["nickname"], "n");
    }

    #[test]
    fn group_params_all_fields_optional() {
        let params: GroupParams = serde_json::from_str("{}").unwrap();
        assert!(params.name.is_none());
        assert!(params.share.is_none());
    }
}
