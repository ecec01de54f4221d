//! Group endpoints: index, show, former, create, update, destroy, join,
//! rejoin and change owners.

use serde::Deserialize;

use crate::client::{check_status, decode, id_segment, GroupMeClient};
use crate::error::{ApiError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{ChangeOwnerRequest, ChangeOwnerResult, Group, GroupParams, ListOptions};

#[derive(Debug, Deserialize)]
struct ChangeOwnersBody {
    results: Vec<ChangeOwnerResult>,
}

/// The change-owners results arrive either enveloped or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChangeOwnersPayload {
    Enveloped { response: ChangeOwnersBody },
    Bare(ChangeOwnersBody),
}

impl GroupMeClient {
    /// `None` means page 1, ten per page, nothing omitted.
    pub fn build_list_groups(&self, options: Option<&ListOptions>) -> HttpRequest {
        let defaults = ListOptions::default();
        let options = options.unwrap_or(&defaults);
        let page = options.page.to_string();
        let per_page = options.per_page.to_string();
        let url = self.url(
            &["groups"],
            &[
                ("page", page.as_str()),
                ("per_page", per_page.as_str()),
                ("omit", options.omit.as_str()),
            ],
        );
        self.get(url)
    }

    /// Fails with `InvalidUrl` for an empty, `.` or `..` id, as do the
    /// other builders that put ids in the path.
    pub fn build_get_group(&self, id: &str) -> Result<HttpRequest> {
        Ok(self.get(self.url(&["groups", id_segment(id)?], &[])))
    }

    pub fn build_list_former_groups(&self) -> HttpRequest {
        self.get(self.url(&["groups", "former"], &[]))
    }

    pub fn build_create_group(&self, params: &GroupParams) -> Result<HttpRequest> {
        self.post_json(self.url(&["groups"], &[]), params)
    }

    pub fn build_update_group(&self, id: &str, params: &GroupParams) -> Result<HttpRequest> {
        self.post_json(self.url(&["groups", id_segment(id)?, "update"], &[]), params)
    }

    pub fn build_delete_group(&self, id: &str) -> Result<HttpRequest> {
        Ok(self.post_empty(self.url(&["groups", id_segment(id)?, "destroy"], &[])))
    }

    pub fn build_join_group(&self, id: &str, share_token: &str) -> Result<HttpRequest> {
        let segments = ["groups", id_segment(id)?, "join", id_segment(share_token)?];
        Ok(self.post_empty(self.url(&segments, &[])))
    }

    /// The group id travels as a parameter, not in the path.
    pub fn build_rejoin_group(&self, id: &str) -> HttpRequest {
        self.post_empty(self.url(&["groups", "join", ""], &[("group_id", id)]))
    }

    pub fn build_change_owners(&self, requests: &[ChangeOwnerRequest]) -> Result<HttpRequest> {
        self.post_json(self.url(&["groups", "change_owners"], &[]), requests)
    }

    pub fn parse_list_groups(&self, response: HttpResponse) -> Result<Vec<Group>> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_get_group(&self, response: HttpResponse) -> Result<Group> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_list_former_groups(&self, response: HttpResponse) -> Result<Vec<Group>> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_create_group(&self, response: HttpResponse) -> Result<Group> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_update_group(&self, response: HttpResponse) -> Result<Group> {
        check_status(&response)?;
        decode(&response)
    }

    /// Any 2xx is success. The body is not inspected.
    pub fn parse_delete_group(&self, response: HttpResponse) -> Result<()> {
        check_status(&response)
    }

    pub fn parse_join_group(&self, response: HttpResponse) -> Result<Group> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_rejoin_group(&self, response: HttpResponse) -> Result<Group> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_change_owners(&self, response: HttpResponse) -> Result<Vec<ChangeOwnerResult>> {
        check_status(&response)?;
        let payload: ChangeOwnersPayload =
            serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(match payload {
            ChangeOwnersPayload::Enveloped { response } => response.results,
            ChangeOwnersPayload::Bare(body) => body.results,
        })
    }
}
