//! A contributor overruns its deadline, gets timed out and
//! handed off, then resumes once its penalty has expired, re-entering the
//! queue at the tail with `contribution_progress` preserved.

use crate::support::{ceremony_input, circuit_input, Harness};
use ceremony_ports::MetaStore;
use shared_types::{ParticipantId, ParticipantStatus};

#[tokio::test]
async fn timed_out_contributor_resumes_with_progress_preserved() {
    let h = Harness::new();
    let alice = ParticipantId::from("alice");

    // fixed_time_window_secs = 0 and penalty_secs = 0 make the deadline
    // (and its expiry) coincide with "now", so the timeout fires and
    // expires without any real sleep.
    let ceremony = h
        .dispatcher
        .setup_ceremony(ceremony_input("s3", vec![circuit_input(1, "s3", Some(0))]))
        .await
        .unwrap();
    h.force_open(&ceremony.id).await;
    let circuit = h.meta_store.list_circuits(&ceremony.id).await.unwrap().into_iter().next().unwrap();

    h.join_and_ready(&ceremony.id, &alice).await;
    let alice_state = h.meta_store.get_participant(&ceremony.id, &alice).await.unwrap();
    assert_eq!(alice_state.status, ParticipantStatus::Contributing);

    let timed_out = h.container.scheduler.enforce_timeouts(&ceremony.id).await.unwrap();
    assert_eq!(timed_out, vec![alice.clone()]);

    let alice_state = h.meta_store.get_participant(&ceremony.id, &alice).await.unwrap();
    assert_eq!(alice_state.status, ParticipantStatus::TimedOut);
    assert_eq!(alice_state.contribution_progress, 0);

    let circuit_after_timeout = h.meta_store.get_circuit(&ceremony.id, &circuit.id).await.unwrap();
    assert_eq!(circuit_after_timeout.waiting_queue.failed_contributions, 1);
    assert!(circuit_after_timeout.waiting_queue.current_contributor.is_none());

    h.dispatcher
        .resume_contribution_after_timeout_expiration(&ceremony.id, &alice)
        .await
        .unwrap();

    let alice_state = h.meta_store.get_participant(&ceremony.id, &alice).await.unwrap();
    assert_eq!(alice_state.status, ParticipantStatus::Contributing);
    assert_eq!(alice_state.contribution_progress, 0);

    let circuit_after_resume = h.meta_store.get_circuit(&ceremony.id, &circuit.id).await.unwrap();
    assert_eq!(circuit_after_resume.waiting_queue.current_contributor, Some(alice));
}
