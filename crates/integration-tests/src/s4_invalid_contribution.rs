//! A contribution that fails verification still advances
//! the participant's progress and the circuit's `failedContributions`
//! counter, but is never assigned the zkey index a valid contribution would
//! have taken.

use crate::support::{ceremony_input, circuit_input, Harness};
use ceremony_ports::MetaStore;
use shared_types::{ContributionStep, ParticipantId, ParticipantStatus};

#[tokio::test]
async fn failing_verification_still_advances_progress_without_claiming_the_index() {
    let h = Harness::new();
    let alice = ParticipantId::from("alice");

    let ceremony = h
        .dispatcher
        .setup_ceremony(ceremony_input("s4", vec![circuit_input(1, "s4", Some(3600))]))
        .await
        .unwrap();
    h.force_open(&ceremony.id).await;
    let circuit = h.meta_store.list_circuits(&ceremony.id).await.unwrap().into_iter().next().unwrap();

    h.join_and_ready(&ceremony.id, &alice).await;

    for step in [ContributionStep::Computing, ContributionStep::Uploading] {
        h.dispatcher
            .progress_to_next_contribution_step(&ceremony.id, &alice, step)
            .await
            .unwrap();
    }
    let object_key = "circuits/s4/contributions/s4_00001.zkey";
    let upload_id = h
        .dispatcher
        .open_multi_part_upload(&ceremony.id, &alice, &ceremony.bucket_name, object_key)
        .await
        .unwrap();
    let chunk = h.blob_store.simulate_part_upload(&upload_id, 1, b"bogus zkey".to_vec());
    h.dispatcher
        .temporary_store_uploaded_chunk_data(&ceremony.id, &alice, &ceremony.bucket_name, object_key, chunk.clone())
        .await
        .unwrap();
    h.dispatcher
        .complete_multi_part_upload(&ceremony.id, &alice, &ceremony.bucket_name, object_key, &upload_id, vec![chunk])
        .await
        .unwrap();

    h.engine.set_next_verdict(false);
    let contribution = h.dispatcher.verify_contribution(&ceremony.id, &circuit.id, &alice).await.unwrap();
    assert!(!contribution.valid);
    assert_eq!(contribution.zkey_index.as_str(), "00001");

    let alice_state = h.meta_store.get_participant(&ceremony.id, &alice).await.unwrap();
    assert_eq!(alice_state.status, ParticipantStatus::Done);
    assert_eq!(alice_state.contribution_progress, 1);

    let circuit_after = h.meta_store.get_circuit(&ceremony.id, &circuit.id).await.unwrap();
    assert_eq!(circuit_after.waiting_queue.completed_contributions, 0);
    assert_eq!(circuit_after.waiting_queue.failed_contributions, 1);

    // The index a valid contribution would have taken is never reused: the
    // next contributor to this circuit would still be assigned "00001"
    // since nothing valid has landed yet.
    assert_eq!(
        ceremony_upload::preconditions::expected_object_key(&circuit_after),
        "circuits/s4/contributions/s4_00001.zkey"
    );
}
