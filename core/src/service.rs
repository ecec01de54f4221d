//! Blocking front door: build, execute and parse in one call.
//!
//! `GroupMe` owns a `GroupMeClient` and a `Transport`. `groups()` and
//! `members()` hand out borrowed operation groups, so one client can serve
//! many threads as long as its transport is `Sync`.

use std::time::Duration;

use crate::client::GroupMeClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{
    AddMembersJob, ChangeOwnerRequest, ChangeOwnerResult, Group, GroupParams, ListOptions, Member,
    MemberAddState,
};

#[derive(Clone)]
pub struct GroupMe<T = UreqTransport> {
    client: GroupMeClient,
    transport: T,
}

impl GroupMe<UreqTransport> {
    /// Client for the public API with the given access token.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_config(ClientConfig::new(token))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> GroupMe<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        Ok(Self {
            client: GroupMeClient::new(config)?,
            transport,
        })
    }

    /// The request builder behind this client.
    pub fn client(&self) -> &GroupMeClient {
        &self.client
    }

    /// A client whose requests time out after `timeout`, sharing this
    /// client's transport.
    pub fn with_timeout(&self, timeout: Duration) -> Result<GroupMe<&T>> {
        let config = self.client.config().clone().timeout(timeout);
        GroupMe::with_transport(config, &self.transport)
    }

    pub fn groups(&self) -> GroupsService<'_, T> {
        GroupsService { api: self }
    }

    pub fn members(&self) -> MembersService<'_, T> {
        MembersService { api: self }
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.transport.execute(request)
    }
}

/// Group operations, borrowed from a `GroupMe`.
pub struct GroupsService<'a, T> {
    api: &'a GroupMe<T>,
}

impl<T: Transport> GroupsService<'_, T> {
    /// The caller's active groups, in server order.
    pub fn list(&self, options: Option<&ListOptions>) -> Result<Vec<Group>> {
        let c = &self.api.client;
        c.parse_list_groups(self.api.send(c.build_list_groups(options))?)
    }

    pub fn get(&self, id: &str) -> Result<Group> {
        let c = &self.api.client;
        c.parse_get_group(self.api.send(c.build_get_group(id)?)?)
    }

    /// Groups the caller left and may rejoin.
    pub fn list_former(&self) -> Result<Vec<Group>> {
        let c = &self.api.client;
        c.parse_list_former_groups(self.api.send(c.build_list_former_groups())?)
    }

    pub fn create(&self, params: &GroupParams) -> Result<Group> {
        let c = &self.api.client;
        c.parse_create_group(self.api.send(c.build_create_group(params)?)?)
    }

    pub fn update(&self, id: &str, params: &GroupParams) -> Result<Group> {
        let c = &self.api.client;
        c.parse_update_group(self.api.send(c.build_update_group(id, params)?)?)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let c = &self.api.client;
        c.parse_delete_group(self.api.send(c.build_delete_group(id)?)?)
    }

    pub fn join(&self, id: &str, share_token: &str) -> Result<Group> {
        let c = &self.api.client;
        c.parse_join_group(self.api.send(c.build_join_group(id, share_token)?)?)
    }

    pub fn rejoin(&self, id: &str) -> Result<Group> {
        let c = &self.api.client;
        c.parse_rejoin_group(self.api.send(c.build_rejoin_group(id))?)
    }

    pub fn change_owners(&self, requests: &[ChangeOwnerRequest]) -> Result<Vec<ChangeOwnerResult>> {
        let c = &self.api.client;
        c.parse_change_owners(self.api.send(c.build_change_owners(requests)?)?)
    }
}

/// Member operations, borrowed from a `GroupMe`.
pub struct MembersService<'a, T> {
    api: &'a GroupMe<T>,
}

impl<T: Transport> MembersService<'_, T> {
    /// Submits the members and returns the job to poll.
    pub fn add(&self, group_id: &str, members: &[Member]) -> Result<AddMembersJob> {
        let c = &self.api.client;
        c.parse_add_members(group_id, self.api.send(c.build_add_members(group_id, members)?)?)
    }

    /// Fails with `ResultsNotReady` or `ResultsExpired` until resolved.
    pub fn results(&self, group_id: &str, results_id: &str) -> Result<Vec<Member>> {
        let c = &self.api.client;
        c.parse_member_results(self.api.send(c.build_member_results(group_id, results_id)?)?)
    }

    pub fn poll_results(&self, job: &AddMembersJob) -> Result<Vec<Member>> {
        self.results(&job.group_id, &job.results_id)
    }

    /// One poll of `job`. Never sleeps; the caller owns the retry cadence.
    pub fn poll(&self, job: &AddMembersJob) -> Result<MemberAddState> {
        let c = &self.api.client;
        let request = c.build_member_results(&job.group_id, &job.results_id)?;
        c.parse_member_add_state(self.api.send(request)?)
    }

    pub fn remove(&self, group_id: &str, membership_id: &str) -> Result<()> {
        let c = &self.api.client;
        c.parse_remove_member(self.api.send(c.build_remove_member(group_id, membership_id)?)?)
    }

    /// Changes the caller's own nickname in the group.
    pub fn rename(&self, group_id: &str, nickname: &str) -> Result<Member> {
        let c = &self.api.client;
        c.parse_rename_member(self.api.send(c.build_rename_member(group_id, nickname)?)?)
    }
}
