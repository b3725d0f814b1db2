// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios: a real authority driven by real agents over HTTP.

use std::sync::Arc;
use std::time::Duration;

use airagent::agent::{spawn_agent, AgentCommand, AgentPhase};
use airagent::client::AuthorityClient;
use airagent::platform::Platform;
use airserver::model::JobStatus;
use airserver::wire::PendingResponse;
use air_specs::{agent_config, server_config, wait_for, Authority};

const TIMEOUT: Duration = Duration::from_secs(10);

fn platform() -> Platform {
    Platform { ip_address: "10.0.0.7".to_owned(), operating_system: "Linux".to_owned() }
}

#[tokio::test]
async fn healthy_responder_works_an_assigned_job() -> anyhow::Result<()> {
    let authority = Authority::start(server_config(1.0)).await?;
    let mut config = agent_config(authority.base_url());
    config.self_assign = false;
    let client = AuthorityClient::new(authority.base_url(), config.request_timeout())?;

    let agent = spawn_agent("Main", client.clone(), Arc::new(config), platform());
    let mut state = agent.subscribe();
    agent.send(AgentCommand::Register);
    let snap = wait_for(&mut state, TIMEOUT, |s| s.phase == AgentPhase::Healthy).await?;
    let responder_id = snap.responder_id.ok_or_else(|| anyhow::anyhow!("no responder id"))?;

    let job_id = client.assign(responder_id).await?.job_id;
    wait_for(&mut state, TIMEOUT, |s| s.jobs_completed == 1).await?;

    let job = authority
        .state()
        .dispatcher
        .job(job_id)?
        .ok_or_else(|| anyhow::anyhow!("job {job_id} missing"))?;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.result.as_deref(), Some("Completed successfully"));
    assert!(job.completed_at.is_some());

    let responder = authority
        .state()
        .registry
        .by_id(responder_id)?
        .ok_or_else(|| anyhow::anyhow!("responder missing"))?;
    assert_eq!(responder.ip_address.as_deref(), Some("10.0.0.7"));
    assert_eq!(responder.operating_system.as_deref(), Some("Linux"));

    // The agent kept its token; the authority has nothing more for it.
    let token = responder.token;
    let pending = client.pending(&token).await?;
    assert!(matches!(pending, PendingResponse::Empty { ref message } if message == "No pending jobs"));

    agent.send(AgentCommand::Exit);
    agent.into_task().await?;
    assert!(authority.active().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn unhealthy_responder_requests_nothing_and_deregisters() -> anyhow::Result<()> {
    let authority = Authority::start(server_config(0.0)).await?;
    let config = agent_config(authority.base_url());
    let client = AuthorityClient::new(authority.base_url(), config.request_timeout())?;

    let agent = spawn_agent("Main", client, Arc::new(config), platform());
    let mut state = agent.subscribe();
    agent.send(AgentCommand::Register);
    let snap = wait_for(&mut state, TIMEOUT, |s| s.phase == AgentPhase::Unhealthy).await?;
    assert_eq!(authority.active().await?.len(), 1);

    // Several poll intervals pass without a job being requested.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(authority.state().dispatcher.job(1)?.is_none());
    assert_eq!(agent.snapshot().jobs_completed, 0);

    agent.send(AgentCommand::Deregister);
    wait_for(&mut state, TIMEOUT, |s| s.phase == AgentPhase::Idle).await?;
    let listed = authority.active().await?;
    assert!(listed.iter().all(|r| Some(r.id) != snap.responder_id));
    assert!(listed.is_empty());
    Ok(())
}

#[tokio::test]
async fn identity_survives_authority_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("air.json");

    let authority = Authority::start_persistent(server_config(1.0), &path).await?;
    let client = AuthorityClient::new(authority.base_url(), Duration::from_secs(5))?;
    let first = client.register(None, Some("Persistent")).await?;
    client.deregister(&first.token).await?;
    drop(client);
    authority.stop().await?;

    let authority = Authority::start_persistent(server_config(1.0), &path).await?;
    let client = AuthorityClient::new(authority.base_url(), Duration::from_secs(5))?;
    let again = client.register(Some(&first.token), None).await?;
    assert_eq!(again.id, first.id);
    assert_eq!(again.name, "Persistent");
    assert_ne!(again.token, first.token);

    let fresh = client.register(None, None).await?;
    assert!(fresh.id > first.id);
    Ok(())
}
