//! A single contributor joins a one-circuit ceremony,
//! runs the full download/compute/upload/verify cycle, and reaches `DONE`.

use crate::support::{ceremony_input, circuit_input, Harness};
use ceremony_ports::MetaStore;
use shared_types::{ContributionStep, ParticipantId, ParticipantStatus};

#[tokio::test]
async fn single_contributor_completes_the_only_circuit() {
    let h = Harness::new();
    let participant_id = ParticipantId::from("alice");

    let ceremony = h
        .dispatcher
        .setup_ceremony(ceremony_input("s1", vec![circuit_input(1, "s1", Some(3600))]))
        .await
        .unwrap();
    h.force_open(&ceremony.id).await;

    h.join_and_ready(&ceremony.id, &participant_id).await;

    let participant = h.meta_store.get_participant(&ceremony.id, &participant_id).await.unwrap();
    assert_eq!(participant.status, ParticipantStatus::Contributing);
    assert_eq!(participant.contribution_step, ContributionStep::Downloading);

    let circuit = h.meta_store.list_circuits(&ceremony.id).await.unwrap().into_iter().next().unwrap();
    let object_key = "circuits/s1/contributions/s1_00001.zkey";

    for step in [ContributionStep::Computing, ContributionStep::Uploading] {
        h.dispatcher
            .progress_to_next_contribution_step(&ceremony.id, &participant_id, step)
            .await
            .unwrap();
    }

    let upload_id = h
        .dispatcher
        .open_multi_part_upload(&ceremony.id, &participant_id, &ceremony.bucket_name, object_key)
        .await
        .unwrap();
    h.dispatcher
        .generate_pre_signed_urls_parts(&ceremony.id, &participant_id, &ceremony.bucket_name, object_key, &upload_id, 1)
        .await
        .unwrap();
    let chunk = h.blob_store.simulate_part_upload(&upload_id, 1, b"new zkey contents".to_vec());
    h.dispatcher
        .temporary_store_uploaded_chunk_data(&ceremony.id, &participant_id, &ceremony.bucket_name, object_key, chunk.clone())
        .await
        .unwrap();
    h.dispatcher
        .complete_multi_part_upload(&ceremony.id, &participant_id, &ceremony.bucket_name, object_key, &upload_id, vec![chunk])
        .await
        .unwrap();

    let contribution = h
        .dispatcher
        .verify_contribution(&ceremony.id, &circuit.id, &participant_id)
        .await
        .unwrap();
    assert!(contribution.valid);
    assert_eq!(contribution.zkey_index.as_str(), "00001");

    let participant = h.meta_store.get_participant(&ceremony.id, &participant_id).await.unwrap();
    assert_eq!(participant.status, ParticipantStatus::Done);
    assert_eq!(participant.contribution_progress, 1);

    let circuit = h.meta_store.get_circuit(&ceremony.id, &circuit.id).await.unwrap();
    assert_eq!(circuit.waiting_queue.completed_contributions, 1);
    assert!(circuit.waiting_queue.current_contributor.is_none());
    assert!(circuit.waiting_queue.is_consistent());
}
