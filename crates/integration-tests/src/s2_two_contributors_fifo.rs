//! Two contributors queue for the same circuit. The first
//! admitted becomes `currentContributor` immediately; the second sits
//! `READY` in the queue and is only promoted once the first hands off.

use crate::support::{ceremony_input, circuit_input, Harness};
use ceremony_ports::MetaStore;
use shared_types::{ContributionStep, ParticipantId, ParticipantStatus};

async fn drive_to_verifying(h: &Harness, ceremony_id: &shared_types::CeremonyId, participant_id: &ParticipantId, bucket: &str, object_key: &str) {
    for step in [ContributionStep::Computing, ContributionStep::Uploading] {
        h.dispatcher
            .progress_to_next_contribution_step(ceremony_id, participant_id, step)
            .await
            .unwrap();
    }
    let upload_id = h
        .dispatcher
        .open_multi_part_upload(ceremony_id, participant_id, bucket, object_key)
        .await
        .unwrap();
    let chunk = h.blob_store.simulate_part_upload(&upload_id, 1, b"zkey".to_vec());
    h.dispatcher
        .temporary_store_uploaded_chunk_data(ceremony_id, participant_id, bucket, object_key, chunk.clone())
        .await
        .unwrap();
    h.dispatcher
        .complete_multi_part_upload(ceremony_id, participant_id, bucket, object_key, &upload_id, vec![chunk])
        .await
        .unwrap();
}

#[tokio::test]
async fn second_contributor_waits_then_is_promoted_on_handoff() {
    let h = Harness::new();
    let alice = ParticipantId::from("alice");
    let bob = ParticipantId::from("bob");

    let ceremony = h
        .dispatcher
        .setup_ceremony(ceremony_input("s2", vec![circuit_input(1, "s2", Some(3600))]))
        .await
        .unwrap();
    h.force_open(&ceremony.id).await;
    let circuit = h.meta_store.list_circuits(&ceremony.id).await.unwrap().into_iter().next().unwrap();

    h.join_and_ready(&ceremony.id, &alice).await;
    h.join_and_ready(&ceremony.id, &bob).await;

    let alice_state = h.meta_store.get_participant(&ceremony.id, &alice).await.unwrap();
    let bob_state = h.meta_store.get_participant(&ceremony.id, &bob).await.unwrap();
    assert_eq!(alice_state.status, ParticipantStatus::Contributing);
    assert_eq!(bob_state.status, ParticipantStatus::Ready);

    let circuit_mid = h.meta_store.get_circuit(&ceremony.id, &circuit.id).await.unwrap();
    assert_eq!(circuit_mid.waiting_queue.contributors, vec![alice.clone(), bob.clone()]);
    assert_eq!(circuit_mid.waiting_queue.current_contributor, Some(alice.clone()));

    let object_key = "circuits/s2/contributions/s2_00001.zkey";
    drive_to_verifying(&h, &ceremony.id, &alice, &ceremony.bucket_name, object_key).await;
    h.dispatcher.verify_contribution(&ceremony.id, &circuit.id, &alice).await.unwrap();

    let bob_state = h.meta_store.get_participant(&ceremony.id, &bob).await.unwrap();
    assert_eq!(bob_state.status, ParticipantStatus::Contributing);
    assert_eq!(bob_state.contribution_step, ContributionStep::Downloading);

    let circuit_after = h.meta_store.get_circuit(&ceremony.id, &circuit.id).await.unwrap();
    assert_eq!(circuit_after.waiting_queue.current_contributor, Some(bob.clone()));
    assert_eq!(circuit_after.waiting_queue.completed_contributions, 1);

    let object_key_bob = "circuits/s2/contributions/s2_00002.zkey";
    drive_to_verifying(&h, &ceremony.id, &bob, &ceremony.bucket_name, object_key_bob).await;
    let contribution = h.dispatcher.verify_contribution(&ceremony.id, &circuit.id, &bob).await.unwrap();
    assert!(contribution.valid);
    assert_eq!(contribution.zkey_index.as_str(), "00002");

    let circuit_final = h.meta_store.get_circuit(&ceremony.id, &circuit.id).await.unwrap();
    assert!(circuit_final.waiting_queue.current_contributor.is_none());
    assert_eq!(circuit_final.waiting_queue.completed_contributions, 2);
}
