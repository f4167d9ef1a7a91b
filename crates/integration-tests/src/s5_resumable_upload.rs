//! A contributor opens a multi-part upload, uploads one
//! part, "crashes" before completing, then reopens the same session:
//! `open_multi_part_upload` must return the same `uploadId` and the
//! already-stored chunk must still be there, so the client can finish
//! uploading only the remaining parts.

use crate::support::{ceremony_input, circuit_input, Harness};
use ceremony_ports::MetaStore;
use shared_types::{ContributionStep, ParticipantId};

#[tokio::test]
async fn reopening_an_upload_resumes_the_same_session() {
    let h = Harness::new();
    let alice = ParticipantId::from("alice");

    let ceremony = h
        .dispatcher
        .setup_ceremony(ceremony_input("s5", vec![circuit_input(1, "s5", Some(3600))]))
        .await
        .unwrap();
    h.force_open(&ceremony.id).await;

    h.join_and_ready(&ceremony.id, &alice).await;
    for step in [ContributionStep::Computing, ContributionStep::Uploading] {
        h.dispatcher
            .progress_to_next_contribution_step(&ceremony.id, &alice, step)
            .await
            .unwrap();
    }

    let object_key = "circuits/s5/contributions/s5_00001.zkey";
    let first_upload_id = h
        .dispatcher
        .open_multi_part_upload(&ceremony.id, &alice, &ceremony.bucket_name, object_key)
        .await
        .unwrap();

    let chunk_one = h.blob_store.simulate_part_upload(&first_upload_id, 1, b"part one".to_vec());
    h.dispatcher
        .temporary_store_uploaded_chunk_data(&ceremony.id, &alice, &ceremony.bucket_name, object_key, chunk_one.clone())
        .await
        .unwrap();

    // "Crash": the client reopens without ever calling complete_upload.
    let second_upload_id = h
        .dispatcher
        .open_multi_part_upload(&ceremony.id, &alice, &ceremony.bucket_name, object_key)
        .await
        .unwrap();
    assert_eq!(first_upload_id, second_upload_id);

    let (stored_upload_id, stored_chunks) = h.container.upload.resumable_state(&ceremony.id, &alice).await.unwrap();
    assert_eq!(stored_upload_id, Some(second_upload_id.clone()));
    assert_eq!(stored_chunks, vec![chunk_one.clone()]);

    let chunk_two = h.blob_store.simulate_part_upload(&second_upload_id, 2, b"part two".to_vec());
    h.dispatcher
        .temporary_store_uploaded_chunk_data(&ceremony.id, &alice, &ceremony.bucket_name, object_key, chunk_two.clone())
        .await
        .unwrap();

    h.dispatcher
        .complete_multi_part_upload(
            &ceremony.id,
            &alice,
            &ceremony.bucket_name,
            object_key,
            &second_upload_id,
            vec![chunk_one, chunk_two],
        )
        .await
        .unwrap();

    let participant = h
        .container
        .meta_store
        .get_participant(&ceremony.id, &alice)
        .await
        .unwrap();
    assert_eq!(participant.contribution_step, ContributionStep::Verifying);
    assert!(participant.temp_contribution_data.upload_id.is_none());
}
