//! Finalization only completes the ceremony once every
//! circuit has landed a valid `final` contribution; finalizing one circuit
//! out of several is not enough.

use crate::support::{ceremony_input, circuit_input, Harness};
use ceremony_ports::MetaStore;
use shared_types::{CeremonyState, Circuit, ContributionStep, ParticipantId, ParticipantStatus};

async fn complete_current_circuit(h: &Harness, ceremony_id: &shared_types::CeremonyId, participant_id: &ParticipantId, circuit: &Circuit) {
    for step in [ContributionStep::Computing, ContributionStep::Uploading] {
        h.dispatcher
            .progress_to_next_contribution_step(ceremony_id, participant_id, step)
            .await
            .unwrap();
    }
    let object_key = format!("circuits/{}/contributions/{}_00001.zkey", circuit.prefix, circuit.prefix);
    let bucket = h.meta_store.get_ceremony(ceremony_id).await.unwrap().bucket_name;
    let upload_id = h
        .dispatcher
        .open_multi_part_upload(ceremony_id, participant_id, &bucket, &object_key)
        .await
        .unwrap();
    let chunk = h.blob_store.simulate_part_upload(&upload_id, 1, b"zkey bytes".to_vec());
    h.dispatcher
        .temporary_store_uploaded_chunk_data(ceremony_id, participant_id, &bucket, &object_key, chunk.clone())
        .await
        .unwrap();
    h.dispatcher
        .complete_multi_part_upload(ceremony_id, participant_id, &bucket, &object_key, &upload_id, vec![chunk])
        .await
        .unwrap();
    h.dispatcher.verify_contribution(ceremony_id, &circuit.id, participant_id).await.unwrap();
}

#[tokio::test]
async fn ceremony_finalizes_only_once_every_circuit_has_landed() {
    let h = Harness::new();
    let alice = ParticipantId::from("alice");

    let ceremony = h
        .dispatcher
        .setup_ceremony(ceremony_input(
            "s6",
            vec![circuit_input(1, "s6a", Some(3600)), circuit_input(2, "s6b", Some(3600))],
        ))
        .await
        .unwrap();
    h.force_open(&ceremony.id).await;

    let mut circuits = h.meta_store.list_circuits(&ceremony.id).await.unwrap();
    circuits.sort_by_key(|c| c.sequence_position);
    let (circuit_a, circuit_b) = (circuits[0].clone(), circuits[1].clone());

    h.join_and_ready(&ceremony.id, &alice).await;
    complete_current_circuit(&h, &ceremony.id, &alice, &circuit_a).await;

    let alice_state = h.meta_store.get_participant(&ceremony.id, &alice).await.unwrap();
    assert_eq!(alice_state.status, ParticipantStatus::Waiting);
    assert_eq!(alice_state.contribution_progress, 1);

    // One more check_participant_for_ceremony call: WAITING -> READY, and
    // since circuit b's queue is empty, READY admits and promotes in the
    // same call.
    let alice_state = h
        .dispatcher
        .check_participant_for_ceremony(&ceremony.id, &alice)
        .await
        .unwrap();
    assert_eq!(alice_state.status, ParticipantStatus::Contributing);

    complete_current_circuit(&h, &ceremony.id, &alice, &circuit_b).await;
    let alice_state = h.meta_store.get_participant(&ceremony.id, &alice).await.unwrap();
    assert_eq!(alice_state.status, ParticipantStatus::Done);
    assert_eq!(alice_state.contribution_progress, 2);

    h.force_close(&ceremony.id).await;

    h.dispatcher.finalize_circuit(&ceremony.id, &circuit_a.id).await.unwrap();
    assert!(h.dispatcher.finalize_ceremony(&ceremony.id).await.is_err());

    let final_b = h.dispatcher.finalize_circuit(&ceremony.id, &circuit_b.id).await.unwrap();
    assert!(final_b.valid);
    assert!(final_b.zkey_index.is_final());

    let ceremony = h.dispatcher.finalize_ceremony(&ceremony.id).await.unwrap();
    assert_eq!(ceremony.state, CeremonyState::Finalized);

    for circuit in [&circuit_a, &circuit_b] {
        assert!(h
            .blob_store
            .object_exists(
                &ceremony.bucket_name,
                &format!("circuits/{}/contributions/{}_final.zkey", circuit.prefix, circuit.prefix)
            )
            .await
            .unwrap());
        assert!(h
            .blob_store
            .object_exists(&ceremony.bucket_name, &format!("circuits/{}/{}_vkey.json", circuit.prefix, circuit.prefix))
            .await
            .unwrap());
        assert!(h
            .blob_store
            .object_exists(&ceremony.bucket_name, &format!("circuits/{}/{}_verifier.sol", circuit.prefix, circuit.prefix))
            .await
            .unwrap());
    }
}
