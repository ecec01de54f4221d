//! Member endpoints: add (asynchronous), results, remove and nickname update.
//!
//! # Design
//! Adding members is asynchronous on the server. `add` answers with a
//! `results_id`; the caller polls the results endpoint until it answers 200
//! (ready), 503 (not ready yet) or 404 (expired). `parse_member_add_state`
//! folds those outcomes into a `MemberAddState` so the polling loop is a
//! plain match. The client itself never waits or retries.

use serde::{Deserialize, Serialize};

use crate::client::{check_status, decode, id_segment, GroupMeClient};
use crate::error::{ApiError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{AddMembersJob, Member, MemberAddState};

#[derive(Debug, Serialize)]
struct AddMembersBody<'a> {
    members: &'a [Member],
}

#[derive(Debug, Deserialize)]
struct AddMembersReceipt {
    results_id: String,
}

#[derive(Debug, Deserialize)]
struct MembersResults {
    #[serde(default)]
    members: Vec<Member>,
}

#[derive(Debug, Serialize)]
struct MembershipUpdate<'a> {
    membership: NicknameUpdate<'a>,
}

#[derive(Debug, Serialize)]
struct NicknameUpdate<'a> {
    nickname: &'a str,
}

impl GroupMeClient {
    /// Fails with `MissingGuid` if any member lacks an idempotency guid.
    pub fn build_add_members(&self, group_id: &str, members: &[Member]) -> Result<HttpRequest> {
        if let Some(member) = members.iter().find(|m| m.guid.is_none()) {
            return Err(ApiError::MissingGuid {
                nickname: member.nickname.clone(),
            });
        }
        self.post_json(
            self.url(&["groups", id_segment(group_id)?, "members", "add"], &[]),
            &AddMembersBody { members },
        )
    }

    pub fn build_member_results(&self, group_id: &str, results_id: &str) -> Result<HttpRequest> {
        let segments = ["groups", id_segment(group_id)?, id_segment(results_id)?];
        Ok(self.get(self.url(&segments, &[("results_id", results_id)])))
    }

    pub fn build_remove_member(&self, group_id: &str, membership_id: &str) -> Result<HttpRequest> {
        let segments = ["groups", id_segment(group_id)?, "members", id_segment(membership_id)?, "remove"];
        Ok(self.post_empty(self.url(&segments, &[])))
    }

    pub fn build_rename_member(&self, group_id: &str, nickname: &str) -> Result<HttpRequest> {
        self.post_json(
            self.url(&["groups", id_segment(group_id)?, "memberships", "update"], &[]),
            &MembershipUpdate {
                membership: NicknameUpdate { nickname },
            },
        )
    }

    pub fn parse_add_members(&self, group_id: &str, response: HttpResponse) -> Result<AddMembersJob> {
        check_status(&response)?;
        let receipt: AddMembersReceipt = decode(&response)?;
        Ok(AddMembersJob {
            group_id: group_id.to_string(),
            results_id: receipt.results_id,
        })
    }

    /// 404 means the results expired, 503 that they are not ready yet.
    pub fn parse_member_results(&self, response: HttpResponse) -> Result<Vec<Member>> {
        match response.status {
            404 => return Err(ApiError::ResultsExpired),
            503 => return Err(ApiError::ResultsNotReady),
            _ => check_status(&response)?,
        }
        let results: MembersResults = decode(&response)?;
        Ok(results.members)
    }

    /// Like `parse_member_results`, but expiry and not-ready are states.
    pub fn parse_member_add_state(&self, response: HttpResponse) -> Result<MemberAddState> {
        match self.parse_member_results(response) {
            Ok(members) => Ok(MemberAddState::Ready(members)),
            Err(ApiError::ResultsNotReady) => Ok(MemberAddState::NotReady),
            Err(ApiError::ResultsExpired) => Ok(MemberAddState::Expired),
            Err(e) => Err(e),
        }
    }

    /// Only 200 counts as removed.
    pub fn parse_remove_member(&self, response: HttpResponse) -> Result<()> {
        if response.status == 200 {
            return Ok(());
        }
        Err(ApiError::RemovalFailed {
            status: response.status,
        })
    }

    pub fn parse_rename_member(&self, response: HttpResponse) -> Result<Member> {
        check_status(&response)?;
        decode(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::http::HttpMethod;

    fn client() -> GroupMeClient {
        GroupMeClient::new(ClientConfig::with_base_url("tok", "http://localhost:3000")).unwrap()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_add_members_wraps_members() {
        let members = vec![
            Member::prospective("Ann").with_user_id("1"),
            Member::prospective("Bob").with_phone_number("+1 2123001234"),
        ];
        let req = client().build_add_members("7", &members).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/groups/7/members/add?token=tok");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        let sent = body["members"].as_array().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["nickname"], "Ann");
        assert_eq!(sent[0]["guid"], members[0].guid.clone().unwrap().as_str());
        assert_eq!(sent[1]["phone_number"], "+1 2123001234");
    }

    #[test]
    fn build_add_members_requires_guid() {
        let members = vec![Member {
            nickname: "NoGuid".to_string(),
            ..Member::default()
        }];
        let err = client().build_add_members("7", &members).unwrap_err();
        assert!(matches!(err, ApiError::MissingGuid { nickname } if nickname == "NoGuid"));
    }

    #[test]
    fn build_member_results_produces_correct_request() {
        let req = client().build_member_results("7", "GHI789").unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/groups/7/GHI789?results_id=GHI789&token=tok");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_remove_member_produces_correct_request() {
        let req = client().build_remove_member("7", "99").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/groups/7/members/99/remove?token=tok");
        assert!(req.body.is_none());
    }

    #[test]
    fn builders_reject_dot_and_empty_ids() {
        let c = client();
        let members = vec![Member::prospective("Ann").with_user_id("1")];
        for id in ["", ".", ".."] {
            assert!(matches!(c.build_add_members(id, &members), Err(ApiError::InvalidUrl(_))));
            assert!(matches!(c.build_member_results(id, "GHI789"), Err(ApiError::InvalidUrl(_))));
            assert!(matches!(c.build_member_results("7", id), Err(ApiError::InvalidUrl(_))));
            assert!(matches!(c.build_remove_member(id, "99"), Err(ApiError::InvalidUrl(_))));
            assert!(matches!(c.build_remove_member("7", id), Err(ApiError::InvalidUrl(_))), "remove {id:?}");
            assert!(matches!(c.build_rename_member(id, "Ann"), Err(ApiError::InvalidUrl(_))));
        }
    }

    #[test]
    fn build_rename_member_wraps_nickname() {
        let req = client().build_rename_member("7", "NEW NAME").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/groups/7/memberships/update?token=tok");
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"membership": {"nickname": "NEW NAME"}}));
    }

    #[test]
    fn parse_add_members_returns_job() {
        let job = client()
            .parse_add_members("7", response(202, r#"{"response":{"results_id":"GHI789"}}"#))
            .unwrap();
        assert_eq!(
            job,
            AddMembersJob {
                group_id: "7".to_string(),
                results_id: "GHI789".to_string(),
            }
        );
    }

    #[test]
    fn parse_member_results_ready() {
        let body = r#"{"response":{"members":[{"id":"1000","user_id":"10000","nickname":"Ann","muted":false,"image_url":null,"autokicked":false,"app_installed":true,"guid":"GUID-1"}]}}"#;
        let members = client().parse_member_results(response(200, body)).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id.as_deref(), Some("1000"));
        assert_eq!(members[0].guid.as_deref(), Some("GUID-1"));
        assert_eq!(members[0].app_installed, Some(true));
    }

    #[test]
    fn parse_member_results_expired_and_not_ready() {
        let err = client().parse_member_results(response(404, "")).unwrap_err();
        assert!(matches!(err, ApiError::ResultsExpired));
        let err = client().parse_member_results(response(503, "")).unwrap_err();
        assert!(matches!(err, ApiError::ResultsNotReady));
    }

    #[test]
    fn parse_member_add_state_transitions() {
        let c = client();
        assert_eq!(c.parse_member_add_state(response(503, "")).unwrap(), MemberAddState::NotReady);
        assert_eq!(c.parse_member_add_state(response(404, "")).unwrap(), MemberAddState::Expired);
        assert_eq!(
            c.parse_member_add_state(response(200, r#"{"response":{"members":[]}}"#)).unwrap(),
            MemberAddState::Ready(Vec::new())
        );
        assert!(matches!(
            c.parse_member_add_state(response(401, "")),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn parse_remove_member_only_accepts_200() {
        assert!(client().parse_remove_member(response(200, "")).is_ok());
        for status in [201, 204, 400, 401, 404, 500] {
            let err = client().parse_remove_member(response(status, "")).unwrap_err();
            assert!(matches!(err, ApiError::RemovalFailed { status: s } if s == status));
        }
    }

    #[test]
    fn parse_rename_member_success() {
        let body = r#"{"response":{"id":"1000","user_id":"10000","nickname":"NEW NAME","muted":false}}"#;
        let member = client().parse_rename_member(response(200, body)).unwrap();
        assert_eq!(member.nickname, "NEW NAME");
    }
}
